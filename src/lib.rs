//! Profile-Sieve: a crawler for JavaScript-rendered search feeds
//!
//! This crate walks a rendered search result feed page by page, visits every
//! profile it links to, and extracts structured records, keeping only the
//! education entries located in a target country.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Profile-Sieve operations
#[derive(Debug, Error)]
pub enum SieveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Render client error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid CSS selector for {name}: '{selector}'")]
    InvalidSelector { name: String, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// A failed render of one URL
///
/// The cause is free text; the retry policy never inspects it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Failed to render {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cause: cause.into(),
        }
    }
}

/// Result type alias for Profile-Sieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_crawl, Coordinator, CrawlRequest, InteractionStep, PageKind};
pub use output::{ProfileSink, RunOutcome, RunStats, RunStatsSnapshot};
pub use record::{EducationEntry, ProfileRecord};

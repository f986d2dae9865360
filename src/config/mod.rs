//! Configuration module for Profile-Sieve
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use profile_sieve::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Filtering on: {}", config.filter.target_country);
//! ```

mod parser;
mod selectors;
mod types;
mod validation;

// Re-export types
pub use selectors::SelectorSet;
pub use types::{
    CacheMode, Config, CrawlerConfig, FilterConfig, OutputConfig, RenderConfig, RetryConfig,
    SelectorConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

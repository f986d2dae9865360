use serde::Deserialize;

/// Main configuration structure for Profile-Sieve
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub filter: FilterConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub render: RenderConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Search results URL the crawl starts from
    #[serde(rename = "search-url")]
    pub search_url: String,

    /// Domains profile links may point to (supports "*.example.com")
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Maximum number of render calls in flight
    #[serde(rename = "max-concurrent-requests", default = "default_max_concurrent")]
    pub max_concurrent_requests: u32,

    /// Maximum number of search pages to walk, counting the first one
    #[serde(rename = "max-search-pages", default = "default_max_search_pages")]
    pub max_search_pages: u32,

    /// Log progress after this many rendered pages
    #[serde(rename = "progress-interval", default = "default_progress_interval")]
    pub progress_interval: u64,
}

/// Education filter configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    /// Country name that must appear in the school or period text
    #[serde(rename = "target-country")]
    pub target_country: String,
}

/// Retry/backoff configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Failures tolerated before a request is dropped
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay unit in milliseconds; attempt n waits unit * 2^n
    #[serde(rename = "base-delay-ms", default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Whether the render client may reuse an earlier render
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheMode {
    Enabled,
    Disabled,
}

/// Render service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    /// Base URL of the rendering service
    pub endpoint: String,

    /// Per-render timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum spacing between two render calls (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    #[serde(rename = "cache-mode", default = "default_cache_mode")]
    pub cache_mode: CacheMode,

    /// User agents handed to the render service, rotated per request
    #[serde(rename = "user-agents", default)]
    pub user_agents: Vec<String>,
}

/// CSS selectors for the search and profile markup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    #[serde(rename = "result-list")]
    pub result_list: String,
    #[serde(rename = "result-entry")]
    pub result_entry: String,
    #[serde(rename = "profile-link")]
    pub profile_link: String,
    #[serde(rename = "next-button")]
    pub next_button: String,
    pub name: String,
    pub headline: String,
    pub location: String,
    #[serde(rename = "current-position")]
    pub current_position: String,
    #[serde(rename = "education-entry")]
    pub education_entry: String,
    pub school: String,
    pub degree: String,
    pub period: String,
    pub skill: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            result_list: "ul.reusable-search__result-list".to_string(),
            result_entry: "ul.reusable-search__result-list li div.entity-result__item"
                .to_string(),
            profile_link: "a.app-aware-link".to_string(),
            next_button: "button[aria-label='Next']".to_string(),
            name: "li.inline.t-24.t-black.t-normal.break-words".to_string(),
            headline: "h2.mt1.t-18.t-black.t-normal.break-words".to_string(),
            location: "li.t-16.t-black.t-normal.inline-block".to_string(),
            current_position: "section#experience-section li.pv-entity__position-group-pager h3.t-16.t-black.t-bold a".to_string(),
            education_entry: "section#education-section li.education__list-item".to_string(),
            school: "h3.pv-entity__school-name".to_string(),
            degree: "p.pv-entity__degree-name span".to_string(),
            period: "p.pv-entity__dates span:nth-child(2)".to_string(),
            skill: "section.pv-skill-categories-section span.pv-skill-category-entity__name-text"
                .to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON Lines file records are appended to
    #[serde(rename = "jsonl-path")]
    pub jsonl_path: String,

    /// Optional SQLite database for records and run history
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

fn default_max_concurrent() -> u32 {
    6
}

fn default_max_search_pages() -> u32 {
    100
}

fn default_progress_interval() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_politeness_delay_ms() -> u64 {
    500
}

fn default_cache_mode() -> CacheMode {
    CacheMode::Enabled
}

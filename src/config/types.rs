use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_MAX_DEPTH: u32 = 3;
pub const DEFAULT_MAX_PAGES: u64 = 100;
pub const DEFAULT_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_DRAIN_GRACE_SECS: u64 = 10;

/// Main configuration structure for gov-scraper
///
/// Every section and key is optional; missing values take the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Seed URL; usually supplied on the command line instead
    #[serde(rename = "start-url")]
    pub start_url: Option<String>,

    /// Maximum link-following depth from the seed (seed is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Total page budget for the run
    #[serde(rename = "max-pages")]
    pub max_pages: u64,

    /// Minimum spacing between dispatches, in seconds
    #[serde(rename = "delay")]
    pub delay_secs: f64,

    /// Number of concurrent fetch workers
    pub workers: usize,

    /// Deadline for fetching and parsing one page, in seconds
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,

    /// Retries on transient network errors and retryable HTTP statuses
    pub retries: u32,

    /// Pause between retries (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// How long in-flight pages may keep running after a stop signal, in seconds
    #[serde(rename = "drain-grace")]
    pub drain_grace_secs: u64,

    /// Keep the query string in dedup keys instead of collapsing it
    #[serde(rename = "keep-query")]
    pub keep_query: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            max_depth: DEFAULT_MAX_DEPTH,
            max_pages: DEFAULT_MAX_PAGES,
            delay_secs: DEFAULT_DELAY_SECS,
            workers: DEFAULT_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retries: DEFAULT_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            drain_grace_secs: DEFAULT_DRAIN_GRACE_SECS,
            keep_query: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        match &self.contact_url {
            Some(url) => format!("{}/{} (+{})", self.crawler_name, self.crawler_version, url),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "gov-scraper".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the stats CSV
    #[serde(rename = "stats-path")]
    pub stats_path: PathBuf,

    /// Path to the error CSV (only written when errors occurred)
    #[serde(rename = "errors-path")]
    pub errors_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            stats_path: PathBuf::from("stats_output.csv"),
            errors_path: PathBuf::from("error_log.csv"),
        }
    }
}

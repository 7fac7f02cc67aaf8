//! gov-scraper: a bounded, same-domain web crawler
//!
//! Starting from a seed URL, the crawler follows links on the seed's own host
//! up to a depth limit and a page budget, records per-page failures without
//! stopping, and writes run statistics and an error log as CSV when it closes.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for gov-scraper operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::EngineState,
        to: state::EngineState,
    },

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

    #[error("Please provide a start URL")]
    MissingStartUrl,

    #[error("Invalid start URL '{url}': {source}")]
    InvalidStartUrl { url: String, source: UrlError },
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
}

/// Failure while processing a single page
///
/// Every variant is recoverable at page granularity: the engine turns it into
/// an [`output::ErrorRecord`] and keeps crawling.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Expected HTML, got {content_type}")]
    ContentMismatch { content_type: String },

    #[error("HTML parse error: {0}")]
    Parse(String),

    #[error("Failed to resolve link '{href}': {source}")]
    Join {
        href: String,
        source: ::url::ParseError,
    },

    #[error("Crawl closed before the page finished")]
    Abandoned,
}

/// Result type alias for gov-scraper operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, SeedConfig};
pub use crawler::{CrawlOutcome, Engine, FetchedPage, HttpFetcher, PageFetcher};
pub use output::{CsvReporter, ErrorRecord, RunReporter, RunStats};
pub use state::EngineState;
pub use url::{in_scope, normalize_url, NormalizedUrl, QueryPolicy};

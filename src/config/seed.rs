use crate::config::types::CrawlerConfig;
use crate::url::{extract_domain, QueryPolicy};
use crate::{ConfigError, UrlError};
use std::time::Duration;
use url::Url;

/// Immutable settings for one crawl run
///
/// Built once from user input before any crawl state exists, then shared
/// read-only with the engine.
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// The start URL exactly as supplied
    pub raw_start_url: String,

    /// The parsed start URL
    pub start_url: Url,

    /// Authority (`host[:port]`) that links must match to be followed
    pub allowed_domain: String,

    /// Maximum link-following depth; the seed is depth 0
    pub max_depth: u32,

    /// Total page budget
    pub max_pages: u64,

    /// Minimum spacing between consecutive dispatches
    pub fetch_delay: Duration,

    /// Number of concurrent fetch workers
    pub workers: usize,

    /// Deadline for one fetch+parse, retries included
    pub fetch_timeout: Duration,

    /// How long in-flight pages may finish after a stop signal
    pub drain_grace: Duration,

    /// Whether the query string is part of the dedup key
    pub query_policy: QueryPolicy,
}

impl SeedConfig {
    /// Builds the run settings from a start URL and crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(SeedConfig)` - The start URL is an absolute http(s) URL with a host
    /// * `Err(ConfigError::MissingStartUrl)` - No start URL (or a blank one) was given
    /// * `Err(ConfigError::InvalidStartUrl)` - The start URL could not be used
    pub fn new(raw_start_url: Option<&str>, crawler: &CrawlerConfig) -> Result<Self, ConfigError> {
        let raw = raw_start_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingStartUrl)?;

        let invalid = |source: UrlError| ConfigError::InvalidStartUrl {
            url: raw.to_string(),
            source,
        };

        let start_url = Url::parse(raw).map_err(|e| invalid(UrlError::Parse(e.to_string())))?;

        if start_url.scheme() != "http" && start_url.scheme() != "https" {
            return Err(invalid(UrlError::InvalidScheme(format!(
                "Only HTTP and HTTPS schemes are supported, got: {}",
                start_url.scheme()
            ))));
        }

        let allowed_domain =
            extract_domain(&start_url).ok_or_else(|| invalid(UrlError::MissingDomain))?;

        let fetch_delay = Duration::try_from_secs_f64(crawler.delay_secs).map_err(|e| {
            ConfigError::Validation(format!("Invalid delay {}: {}", crawler.delay_secs, e))
        })?;

        let query_policy = if crawler.keep_query {
            QueryPolicy::Keep
        } else {
            QueryPolicy::Ignore
        };

        Ok(Self {
            raw_start_url: raw.to_string(),
            start_url,
            allowed_domain,
            max_depth: crawler.max_depth,
            max_pages: crawler.max_pages,
            fetch_delay,
            workers: crawler.workers,
            fetch_timeout: Duration::from_secs(crawler.timeout_secs),
            drain_grace: Duration::from_secs(crawler.drain_grace_secs),
            query_policy,
        })
    }
}

//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - The `PageFetcher` seam the engine fetches through
//! - Building HTTP clients with proper user agent strings
//! - Retry logic for transient failures
//! - Content-Type checks and error classification

use crate::config::{Config, UserAgentConfig};
use crate::crawler::parser::extract_hrefs;
use crate::PageError;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one page
pub const MAX_REDIRECTS: usize = 10;

/// HTTP statuses worth another attempt
const RETRY_STATUSES: [u16; 8] = [408, 429, 500, 502, 503, 504, 522, 524];

/// A page that was fetched and parsed successfully
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; relative links are joined against it
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Raw `href` values in document order
    pub links: Vec<String>,
}

/// Fetch-and-extract collaborator used by the engine
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and extracts its outgoing links
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, PageError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Upper bound for any single request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use gov_scraper::config::UserAgentConfig;
/// use gov_scraper::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// One failed attempt, tagged with whether retrying could help
struct AttemptError {
    error: PageError,
    transient: bool,
}

impl AttemptError {
    fn permanent(error: PageError) -> Self {
        Self {
            error,
            transient: false,
        }
    }
}

/// `PageFetcher` backed by reqwest and scraper
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    request_timeout: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher around an existing client
    pub fn new(client: Client, request_timeout: Duration, retries: u32, retry_delay: Duration) -> Self {
        Self {
            client,
            request_timeout,
            retries,
            retry_delay,
        }
    }

    /// Creates a fetcher from the loaded configuration
    ///
    /// The page timeout covers every attempt, so each attempt gets an equal
    /// share of it. A slow first response then still leaves room for a retry.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let page_timeout = Duration::from_secs(config.crawler.timeout_secs);
        let attempt_timeout = attempt_timeout(page_timeout, config.crawler.retries);
        let client = build_http_client(&config.user_agent, page_timeout)?;
        Ok(Self::new(
            client,
            attempt_timeout,
            config.crawler.retries,
            Duration::from_millis(config.crawler.retry_delay_ms),
        ))
    }

    /// Performs a single GET and parses the body
    ///
    /// # Request Flow
    ///
    /// 1. Send GET; reqwest follows up to 10 redirects
    /// 2. Non-2xx status → `HttpStatus`
    /// 3. Content-Type present but not HTML → `ContentMismatch`
    /// 4. Read the body and extract `a[href]` values
    async fn fetch_once(&self, url: &Url) -> Result<FetchedPage, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(AttemptError {
                error: PageError::HttpStatus {
                    status: status.as_u16(),
                },
                transient: is_retry_status(status),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(content_type) = content_type {
            if !is_html(&content_type) {
                return Err(AttemptError::permanent(PageError::ContentMismatch {
                    content_type,
                }));
            }
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        let links = extract_hrefs(&body).map_err(AttemptError::permanent)?;

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            links,
        })
    }

    fn classify(&self, error: reqwest::Error) -> AttemptError {
        if error.is_timeout() {
            AttemptError {
                error: PageError::Timeout(self.request_timeout),
                transient: true,
            }
        } else if error.is_connect() {
            AttemptError {
                error: PageError::Network(error.to_string()),
                transient: true,
            }
        } else if error.is_redirect() {
            AttemptError::permanent(PageError::Network(format!(
                "Too many redirects (limit {}): {}",
                MAX_REDIRECTS, error
            )))
        } else {
            AttemptError::permanent(PageError::Network(error.to_string()))
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, PageError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(failure) if failure.transient && attempt < self.retries => {
                    attempt += 1;
                    tracing::debug!(
                        "Retrying {} ({}/{}) after: {}",
                        url,
                        attempt,
                        self.retries,
                        failure.error
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }
}

/// Splits a page deadline evenly across the first attempt and its retries
fn attempt_timeout(page_timeout: Duration, retries: u32) -> Duration {
    page_timeout / retries.saturating_add(1)
}

fn is_retry_status(status: StatusCode) -> bool {
    RETRY_STATUSES.contains(&status.as_u16())
}

fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_test_fetcher(retries: u32) -> HttpFetcher {
        let timeout = Duration::from_secs(5);
        let client = build_http_client(&UserAgentConfig::default(), timeout).unwrap();
        HttpFetcher::new(client, timeout, retries, Duration::from_millis(10))
    }

    fn html(body: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30));
        assert!(client.is_ok());
    }

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html"));
        assert!(is_html("text/html; charset=utf-8"));
        assert!(is_html("TEXT/HTML"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("application/pdf"));
        assert!(!is_html("text/plain"));
    }

    #[test]
    fn test_retry_statuses() {
        assert!(is_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retry_status(StatusCode::NOT_FOUND));
        assert!(!is_retry_status(StatusCode::FORBIDDEN));
    }

    #[test]
    fn test_attempt_timeout_shares_page_deadline() {
        assert_eq!(attempt_timeout(Duration::from_secs(30), 2), Duration::from_secs(10));
        assert_eq!(attempt_timeout(Duration::from_secs(30), 0), Duration::from_secs(30));

        let mut config = Config::default();
        config.crawler.timeout_secs = 12;
        config.crawler.retries = 3;
        let fetcher = HttpFetcher::from_config(&config).unwrap();
        assert_eq!(fetcher.request_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_fetch_retries_slow_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(html("<p>late</p>").set_delay(Duration::from_millis(500)))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(html(r#"<a href="/next">Next</a>"#))
            .with_priority(2)
            .mount(&server)
            .await;

        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();
        let fetcher = HttpFetcher::new(client, Duration::from_millis(150), 1, Duration::from_millis(10));

        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.links, vec!["/next"]);
    }

    #[tokio::test]
    async fn test_fetch_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(html("<p>late</p>").set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap();
        let fetcher = HttpFetcher::new(client, Duration::from_millis(100), 0, Duration::from_millis(10));

        let url = Url::parse(&format!("{}/slow", server.uri())).unwrap();
        let result = fetcher.fetch(&url).await;

        assert!(matches!(result, Err(PageError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_extracts_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(html(r#"<a href="/about">About</a><a href="http://other.example/x">X</a>"#))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/", server.uri())).unwrap();
        let page = create_test_fetcher(0).fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert_eq!(page.final_url, url);
        assert_eq!(page.links, vec!["/about", "http://other.example/x"]);
    }

    #[tokio::test]
    async fn test_fetch_follows_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new/"))
            .respond_with(html(r#"<a href="child">Child</a>"#))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();
        let page = create_test_fetcher(0).fetch(&url).await.unwrap();

        assert_eq!(page.final_url.path(), "/new/");
        assert_eq!(page.links, vec!["child"]);
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
        let result = create_test_fetcher(2).fetch(&url).await;

        assert!(matches!(result, Err(PageError::HttpStatus { status: 404 })));
    }

    #[tokio::test]
    async fn test_fetch_content_mismatch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/report.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/report.pdf", server.uri())).unwrap();
        let result = create_test_fetcher(0).fetch(&url).await;

        assert!(matches!(result, Err(PageError::ContentMismatch { .. })));
    }

    #[tokio::test]
    async fn test_fetch_retries_transient_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(html("<p>ok</p>"))
            .with_priority(2)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();
        let page = create_test_fetcher(2).fetch(&url).await.unwrap();

        assert_eq!(page.status, 200);
        assert!(page.links.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/down", server.uri())).unwrap();
        let result = create_test_fetcher(2).fetch(&url).await;

        assert!(matches!(result, Err(PageError::HttpStatus { status: 503 })));
    }
}

use url::Url;

/// Extracts the authority used for scoping: the host plus any explicit port
///
/// The host is lowercased. A default port (80 for http, 443 for https) is not
/// part of the result, so `http://example.com:80/` and `http://example.com/`
/// share an authority.
///
/// # Arguments
///
/// * `url` - The URL to extract the domain from
///
/// # Returns
///
/// * `Some(String)` - The lowercase `host[:port]`
/// * `None` - If the URL has no host
///
/// # Examples
///
/// ```
/// use url::Url;
/// use gov_scraper::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://127.0.0.1:8080/").unwrap();
/// assert_eq!(extract_domain(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host),
    }
}

/// Checks whether a URL may be followed from a seed on `allowed_domain`
///
/// The comparison is exact: a subdomain of the allowed domain is out of scope,
/// and so is the same host on a different port.
pub fn in_scope(url: &Url, allowed_domain: &str) -> bool {
    extract_domain(url).is_some_and(|domain| domain == allowed_domain)
}

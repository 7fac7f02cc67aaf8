use crate::UrlError;
use std::fmt;
use url::Url;

/// How the query string takes part in the dedup key
///
/// `Ignore` collapses every query-parameterized variant of a path onto one
/// key. This bounds frontier growth on sites that paginate or sort through
/// query parameters, at the cost of never visiting the other variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryPolicy {
    /// Drop the query string from the key
    #[default]
    Ignore,
    /// Keep the query string verbatim in the key
    Keep,
}

/// A canonical comparison key for a URL: `scheme://host[:port]path`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes an absolute URL into its dedup key
///
/// # Normalization Steps
///
/// 1. Keep the scheme as parsed
/// 2. Keep the host as parsed (the URL parser already lowercases it)
/// 3. Keep an explicit port; default ports are dropped by the parser
/// 4. Keep the path verbatim: no percent-decoding, no trailing-slash changes
/// 5. Drop the fragment
/// 6. Drop the query unless the policy is [`QueryPolicy::Keep`]
///
/// Applying the function to its own output returns the same key.
///
/// # Arguments
///
/// * `url` - An absolute URL, already resolved against its base
/// * `policy` - Whether the query string is part of the key
///
/// # Returns
///
/// * `Ok(NormalizedUrl)` - The key
/// * `Err(UrlError::MissingDomain)` - The URL has no host (e.g. `mailto:`)
///
/// # Examples
///
/// ```
/// use gov_scraper::url::{normalize_url, QueryPolicy};
/// use url::Url;
///
/// let url = Url::parse("http://gov.example/about?lang=en#team").unwrap();
/// let key = normalize_url(&url, QueryPolicy::Ignore).unwrap();
/// assert_eq!(key.as_str(), "http://gov.example/about");
/// ```
pub fn normalize_url(url: &Url, policy: QueryPolicy) -> Result<NormalizedUrl, UrlError> {
    let host = url.host_str().ok_or(UrlError::MissingDomain)?;

    let mut key = String::with_capacity(url.as_str().len());
    key.push_str(url.scheme());
    key.push_str("://");
    key.push_str(host);
    if let Some(port) = url.port() {
        key.push(':');
        key.push_str(&port.to_string());
    }
    key.push_str(url.path());

    if policy == QueryPolicy::Keep {
        if let Some(query) = url.query() {
            key.push('?');
            key.push_str(query);
        }
    }

    Ok(NormalizedUrl(key))
}

/// Parses a URL string and normalizes it
///
/// Relative input is rejected: there is no base to resolve it against.
pub fn normalize_str(url_str: &str, policy: QueryPolicy) -> Result<NormalizedUrl, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_url(&url, policy)
}

/// Returns a copy of the URL with its fragment removed
pub fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}

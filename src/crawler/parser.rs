//! HTML parser for extracting links
//!
//! Links are returned exactly as written in the markup. Resolution against
//! the page URL, scoping, and dedup all happen later in the engine, so a
//! `mailto:` or off-site link still shows up here and is counted as skipped.

use crate::PageError;
use scraper::{Html, Selector};

/// Extracts the `href` of every `<a>` element, in document order
///
/// # Arguments
///
/// * `html` - The HTML content to parse
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Raw href values, whitespace-trimmed
/// * `Err(PageError::Parse)` - The link selector could not be built
///
/// # Example
///
/// ```
/// use gov_scraper::crawler::extract_hrefs;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// assert_eq!(extract_hrefs(html).unwrap(), vec!["/page"]);
/// ```
pub fn extract_hrefs(html: &str) -> Result<Vec<String>, PageError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").map_err(|e| PageError::Parse(e.to_string()))?;

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(|href| href.trim().to_string())
        .collect())
}

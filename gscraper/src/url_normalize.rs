//! Canonical URL form used to recognise the same page across listing pages.
//!
//! Listings often repeat a result on a later page with a different tracking
//! suffix; comparing canonical forms keeps the harvest to distinct pages.

use url::Url;

/// Query parameters that never change which page is served.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ved",
    "usg",
    "sa",
];

/// Canonicalise `raw`: lowercase scheme and host, no default port, no
/// fragment, no tracking parameters, remaining parameters sorted, no
/// trailing slash except on the root path.
///
/// Unparsable input is returned unchanged.
///
/// ```
/// use gscraper::url_normalize::normalize_url;
///
/// let a = normalize_url("https://Example.COM/path/?b=2&a=1#top");
/// let b = normalize_url("https://example.com/path?a=1&b=2&utm_source=x");
/// assert_eq!(a, b);
/// ```
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_owned();
    };

    parsed.set_fragment(None);
    if matches!(
        (parsed.scheme(), parsed.port()),
        ("http", Some(80)) | ("https", Some(443))
    ) {
        let _ = parsed.set_port(None);
    }

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.to_ascii_lowercase().as_str()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(params);
    }

    let path = parsed.path().to_owned();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(&path[..path.len() - 1]);
    }

    parsed.to_string()
}

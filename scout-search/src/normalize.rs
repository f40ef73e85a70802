//! URI canonicalisation for grounding-source deduplication.
//!
//! Two URIs that differ only in host case, default port, fragment,
//! tracking parameters, query-parameter order or a trailing slash refer to
//! the same page and share one key.

use url::Url;

/// Query parameters that never identify content.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "ref",
    "ref_src",
    "si",
];

/// Returns the comparison key for `raw`.
///
/// If the input cannot be parsed as a URL, the trimmed input is the key.
///
/// # Examples
///
/// ```
/// use scout_search::normalize::uri_key;
///
/// let a = uri_key("https://Sketchfab.COM/3d-models/dragon/?utm_source=x#viewer");
/// let b = uri_key("https://sketchfab.com/3d-models/dragon");
/// assert_eq!(a, b);
/// ```
pub fn uri_key(raw: &str) -> String {
    let trimmed = raw.trim();
    let Ok(mut parsed) = Url::parse(trimmed) else {
        return trimmed.to_string();
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
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    if params.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_host_but_not_path() {
        assert_eq!(
            uri_key("HTTPS://CGTrader.COM/3d-models/Dragon"),
            "https://cgtrader.com/3d-models/Dragon"
        );
    }

    #[test]
    fn strips_trailing_slash_but_keeps_root() {
        assert_eq!(uri_key("https://fab.com/listings/x/"), "https://fab.com/listings/x");
        assert_eq!(uri_key("https://fab.com/"), "https://fab.com/");
    }

    #[test]
    fn removes_default_port_only() {
        assert_eq!(uri_key("https://fab.com:443/a"), "https://fab.com/a");
        assert_eq!(uri_key("https://fab.com:8443/a"), "https://fab.com:8443/a");
    }

    #[test]
    fn drops_tracking_params_and_sorts_the_rest() {
        assert_eq!(
            uri_key("https://free3d.com/3d-model/x?z=1&utm_medium=a&a=2&gclid=g"),
            "https://free3d.com/3d-model/x?a=2&z=1"
        );
    }

    #[test]
    fn fragment_removed() {
        assert_eq!(uri_key("https://hum3d.com/a#top"), "https://hum3d.com/a");
    }

    #[test]
    fn grounding_redirect_uris_stay_distinct() {
        let a = uri_key("https://vertexaisearch.cloud.google.com/grounding-api-redirect/AAA");
        let b = uri_key("https://vertexaisearch.cloud.google.com/grounding-api-redirect/BBB");
        assert_ne!(a, b);
    }

    #[test]
    fn unparseable_input_is_trimmed() {
        assert_eq!(uri_key("  not a url "), "not a url");
        assert_eq!(uri_key(""), "");
    }
}

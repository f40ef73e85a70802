//! Known 3D asset marketplaces.
//!
//! The same fixed list both biases the oracle's web search (as `site:`
//! filters) and validates download URLs during admission.

use url::Url;

/// A marketplace the oracle is steered towards and whose links are trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marketplace {
    /// Human-readable label.
    pub name: &'static str,
    /// Registrable domain matched against download URL hosts.
    pub domain: &'static str,
    /// Search filter sent to the oracle (may include a path).
    pub site_filter: &'static str,
}

/// The marketplace allow-list.
pub const MARKETPLACES: &[Marketplace] = &[
    Marketplace { name: "Sketchfab", domain: "sketchfab.com", site_filter: "sketchfab.com" },
    Marketplace { name: "CGTrader", domain: "cgtrader.com", site_filter: "cgtrader.com" },
    Marketplace { name: "TurboSquid", domain: "turbosquid.com", site_filter: "turbosquid.com" },
    Marketplace { name: "ArtStation", domain: "artstation.com", site_filter: "artstation.com/marketplace" },
    Marketplace { name: "Unity Asset Store", domain: "unity.com", site_filter: "assetstore.unity.com" },
    Marketplace { name: "Fab", domain: "fab.com", site_filter: "fab.com" },
    Marketplace { name: "Unreal Marketplace", domain: "unrealengine.com", site_filter: "unrealengine.com/marketplace" },
    Marketplace { name: "Poly Haven", domain: "polyhaven.com", site_filter: "polyhaven.com" },
    Marketplace { name: "RenderHub", domain: "renderhub.com", site_filter: "renderhub.com" },
    Marketplace { name: "3dsky", domain: "3dsky.org", site_filter: "3dsky.org" },
    Marketplace { name: "Free3D", domain: "free3d.com", site_filter: "free3d.com" },
    Marketplace { name: "Hum3D", domain: "hum3d.com", site_filter: "hum3d.com" },
    Marketplace { name: "Three D Scans", domain: "threedscans.com", site_filter: "threedscans.com" },
];

/// URL fragments that mark listing pages rather than individual assets.
pub const EXCLUDED_URL_TERMS: &[&str] = &["search", "category", "tags"];

/// Returns the `site:` filters, one per marketplace.
pub fn site_filters() -> Vec<String> {
    MARKETPLACES
        .iter()
        .map(|m| format!("site:{}", m.site_filter))
        .collect()
}

/// Returns the web search expression biasing results towards marketplaces.
///
/// ```
/// let expr = scout_search::marketplace::search_expression("dragon");
/// assert!(expr.starts_with("dragon 3D model (site:sketchfab.com OR"));
/// assert!(expr.ends_with("-inurl:tags"));
/// ```
pub fn search_expression(query: &str) -> String {
    let sites = site_filters().join(" OR ");
    let negatives: Vec<String> = EXCLUDED_URL_TERMS
        .iter()
        .map(|term| format!("-inurl:{term}"))
        .collect();
    format!("{} 3D model ({sites}) {}", query.trim(), negatives.join(" "))
}

/// Returns the marketplace hosting `raw_url`, if any.
///
/// The URL host must equal a marketplace domain or be a subdomain of it;
/// a domain appearing only in the path or query does not count.
pub fn marketplace_for(raw_url: &str) -> Option<&'static Marketplace> {
    let url = Url::parse(raw_url.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    MARKETPLACES.iter().find(|m| {
        host == m.domain
            || host
                .strip_suffix(m.domain)
                .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

/// Returns true if `raw_url` is hosted on a known marketplace.
pub fn is_known_marketplace(raw_url: &str) -> bool {
    marketplace_for(raw_url).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_has_thirteen_entries() {
        assert_eq!(MARKETPLACES.len(), 13);
        assert_eq!(site_filters().len(), 13);
    }

    #[test]
    fn site_filters_keep_marketplace_paths() {
        let filters = site_filters();
        assert!(filters.contains(&"site:artstation.com/marketplace".to_string()));
        assert!(filters.contains(&"site:assetstore.unity.com".to_string()));
    }

    #[test]
    fn search_expression_contains_negatives() {
        let expr = search_expression("  castle ");
        assert!(expr.starts_with("castle 3D model ("));
        assert!(expr.contains("-inurl:search -inurl:category -inurl:tags"));
    }

    #[test]
    fn exact_host_matches() {
        assert!(is_known_marketplace("https://sketchfab.com/3d-models/dragon-123"));
        assert!(is_known_marketplace("https://3dsky.org/3dmodels/show/x"));
    }

    #[test]
    fn subdomain_matches() {
        let m = marketplace_for("https://assetstore.unity.com/packages/3d/dragon").expect("unity");
        assert_eq!(m.domain, "unity.com");
        assert!(is_known_marketplace("https://www.cgtrader.com/3d-models/dragon"));
    }

    #[test]
    fn host_matching_is_case_insensitive() {
        assert!(is_known_marketplace("HTTPS://WWW.TurboSquid.COM/3d-models/x"));
    }

    #[test]
    fn lookalike_domains_rejected() {
        assert!(!is_known_marketplace("https://notsketchfab.com/model"));
        assert!(!is_known_marketplace("https://sketchfab.com.evil.io/model"));
    }

    #[test]
    fn domain_in_path_rejected() {
        assert!(!is_known_marketplace("https://example.com/redirect/sketchfab.com/x"));
    }

    #[test]
    fn invalid_or_non_http_urls_rejected() {
        assert!(!is_known_marketplace("sketchfab.com/models/x"));
        assert!(!is_known_marketplace("ftp://sketchfab.com/x"));
        assert!(!is_known_marketplace(""));
    }
}

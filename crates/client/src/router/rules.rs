//! Requests the router must never intercept.

use reqwest::Method;
use url::Url;

/// Path and host fragments excluded from interception.
///
/// Matching is by substring, so `/cart` also covers `/cart/add.js` and
/// `/cart.json`, and `shopify` covers every `*.myshopify.com` host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    pub paths: Vec<String>,
    pub hosts: Vec<String>,
}

impl ExclusionRules {
    pub fn new(paths: Vec<String>, hosts: Vec<String>) -> Self {
        Self { paths, hosts }
    }

    pub fn matches(&self, url: &Url) -> bool {
        let path = url.path();
        let host = url.host_str().unwrap_or_default();
        self.paths.iter().any(|p| path.contains(p.as_str())) || self.hosts.iter().any(|h| host.contains(h.as_str()))
    }
}

/// Only safe, idempotent retrievals are ever cached.
pub fn is_cacheable_method(method: &Method) -> bool {
    *method == Method::GET
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ExclusionRules {
        ExclusionRules::new(
            vec!["/admin".into(), "/checkout".into(), "/cart".into()],
            vec!["shopify".into()],
        )
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_excluded_paths() {
        let rules = rules();
        assert!(rules.matches(&url("https://store.example/admin")));
        assert!(rules.matches(&url("https://store.example/checkout")));
        assert!(rules.matches(&url("https://store.example/cart/add.js")));
        assert!(rules.matches(&url("https://store.example/cart.json")));
        assert!(rules.matches(&url("https://store.example/account/admin/orders")));
    }

    #[test]
    fn test_excluded_hosts() {
        let rules = rules();
        assert!(rules.matches(&url("https://cdn.shopify.com/s/files/logo.png")));
        assert!(rules.matches(&url("https://kala.myshopify.com/")));
    }

    #[test]
    fn test_not_excluded() {
        let rules = rules();
        assert!(!rules.matches(&url("https://store.example/")));
        assert!(!rules.matches(&url("https://store.example/collections/all")));
        assert!(!rules.matches(&url("https://store.example/search?q=cart")));
    }

    #[test]
    fn test_empty_rules_match_nothing() {
        assert!(!ExclusionRules::default().matches(&url("https://store.example/checkout")));
    }

    #[test]
    fn test_cacheable_method() {
        assert!(is_cacheable_method(&Method::GET));
        assert!(!is_cacheable_method(&Method::POST));
        assert!(!is_cacheable_method(&Method::HEAD));
    }
}

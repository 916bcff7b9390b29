//! Request-addressed cache keys.

use sha2::{Digest, Sha256};

/// Normalized request identity: method plus canonical URL.
///
/// Two requests share a key exactly when they share method and URL; headers
/// never participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub method: String,
    pub url: String,
    pub hash: String,
}

impl CacheKey {
    pub fn new(method: &str, url: &str) -> Self {
        let method = method.to_ascii_uppercase();
        let hash = compute_cache_key(&method, url);
        Self { method, url: url.to_string(), hash }
    }
}

/// Compute the hex SHA-256 key for a request.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", "https://example.com/");
        let hash2 = compute_cache_key("GET", "https://example.com/");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_different_method() {
        assert_ne!(compute_cache_key("GET", "https://example.com/"), compute_cache_key("HEAD", "https://example.com/"));
    }

    #[test]
    fn test_key_uppercases_method() {
        let lower = CacheKey::new("get", "https://example.com/a.css");
        let upper = CacheKey::new("GET", "https://example.com/a.css");
        assert_eq!(lower, upper);
        assert_eq!(lower.method, "GET");
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", "https://example.com/");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! cache_purge tool implementation.
//!
//! Trims one partition by URL pattern, entry count, or both.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error};

use crate::tools::json_result;

/// Parameters for the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeParams {
    /// Physical partition name.
    pub partition: String,

    /// Purge entries whose URL contains this substring.
    pub url_pattern: Option<String>,

    /// Keep only the newest N entries (LRU purge).
    pub max_entries: Option<usize>,
}

/// Output from the cache_purge tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CachePurgeOutput {
    /// Number of entries deleted.
    pub deleted: u64,
    /// Entries left in the partition.
    pub remaining: u64,
}

/// Implementation of the cache_purge tool.
pub async fn purge_impl(cache: &CacheDb, params: &CachePurgeParams) -> Result<CallToolResult, McpError> {
    if params.url_pattern.is_none() && params.max_entries.is_none() {
        return Err(Error::InvalidInput("At least one of url_pattern or max_entries must be specified".into()).into());
    }
    if !cache.has_partition(&params.partition).await? {
        return Err(Error::InvalidInput(format!("unknown partition: {}", params.partition)).into());
    }

    let mut deleted = 0u64;

    if let Some(pattern) = params.url_pattern.as_deref().filter(|p| !p.is_empty()) {
        deleted += cache.purge_entries_by_url(&params.partition, pattern).await?;
    }

    if let Some(max) = params.max_entries {
        deleted += cache.purge_lru_entries(&params.partition, max).await?;
    }

    let remaining = cache.count_entries(&params.partition).await?;
    tracing::info!(partition = %params.partition, deleted, remaining, "purged partition entries");

    json_result(&CachePurgeOutput { deleted, remaining })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::parse;
    use shellcache_core::{CacheKey, CachedResponse};

    async fn seeded() -> CacheDb {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let partition = cache.open_partition("kala-images-v2.0").await.unwrap();
        let response = CachedResponse { status: 200, headers: Vec::new(), body: vec![0u8; 4] };
        for url in ["/a.png", "/b.png", "/products/c.jpg"] {
            let key = CacheKey::new("GET", &format!("https://store.example{url}"));
            partition.put(&key, &response).await.unwrap();
        }
        cache
    }

    #[tokio::test]
    async fn test_purge_requires_criteria() {
        let cache = seeded().await;
        let params = CachePurgeParams { partition: "kala-images-v2.0".into(), url_pattern: None, max_entries: None };
        assert!(purge_impl(&cache, &params).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_unknown_partition() {
        let cache = seeded().await;
        let params = CachePurgeParams { partition: "missing-v1".into(), url_pattern: None, max_entries: Some(1) };
        assert!(purge_impl(&cache, &params).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_by_pattern() {
        let cache = seeded().await;
        let params = CachePurgeParams {
            partition: "kala-images-v2.0".into(),
            url_pattern: Some("/products/".into()),
            max_entries: None,
        };

        let output: CachePurgeOutput = parse(&purge_impl(&cache, &params).await.unwrap());
        assert_eq!(output.deleted, 1);
        assert_eq!(output.remaining, 2);
    }

    #[tokio::test]
    async fn test_purge_lru() {
        let cache = seeded().await;
        let params = CachePurgeParams { partition: "kala-images-v2.0".into(), url_pattern: None, max_entries: Some(1) };

        let output: CachePurgeOutput = parse(&purge_impl(&cache, &params).await.unwrap());
        assert_eq!(output.deleted, 2);
        assert_eq!(output.remaining, 1);
    }
}

//! cache_get tool implementation.
//!
//! Looks up one stored response without touching the network.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Fetcher, Worker, canonicalize};
use shellcache_core::{CacheKey, Error};

use crate::tools::json_result;

/// Parameters for the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetParams {
    /// Physical partition name, e.g. "kala-static-v2.0".
    pub partition: String,

    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method the entry was stored under (default: GET).
    #[serde(default)]
    pub method: Option<String>,
}

/// Output from the cache_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheGetOutput {
    pub partition: String,
    pub url: String,
    pub key_hash: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8 (lossy).
    pub body: String,
    pub body_bytes: usize,
}

/// Implementation of the cache_get tool.
pub async fn get_impl<F: Fetcher>(worker: &Worker<F>, params: CacheGetParams) -> Result<CallToolResult, McpError> {
    let url = canonicalize(&params.url, Some(&worker.router().config().origin))
        .map_err(|e| Error::InvalidUrl(e.to_string()))?;
    let key = CacheKey::new(params.method.as_deref().unwrap_or("GET"), url.as_str());

    let cached = worker
        .router()
        .store_handle()
        .match_entry(&params.partition, &key)
        .await?
        .ok_or_else(|| Error::CacheMiss(format!("{} in {}", key.url, params.partition)))?;

    let output = CacheGetOutput {
        partition: params.partition,
        url: key.url,
        key_hash: key.hash,
        status: cached.status,
        headers: cached.headers,
        body: String::from_utf8_lossy(&cached.body).into_owned(),
        body_bytes: cached.body.len(),
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::test_support::{active_worker, parse};
    use shellcache_core::CachedResponse;

    #[tokio::test]
    async fn test_get_impl_missing() {
        let worker = active_worker().await;
        let params = CacheGetParams { partition: "kala-static-v2.0".into(), url: "/".into(), method: None };

        let err = get_impl(&worker, params).await.unwrap_err();
        assert!(err.message.contains("CACHE_MISS"));
    }

    #[tokio::test]
    async fn test_get_impl_found() {
        let worker = active_worker().await;
        let key = CacheKey::new("GET", "https://store.example/assets/theme.css");
        let response = CachedResponse {
            status: 200,
            headers: vec![("content-type".into(), "text/css".into())],
            body: b"body { margin: 0 }".to_vec(),
        };
        worker.router().store_handle().put_entry("kala-static-v2.0", &key, &response).await.unwrap();

        let params =
            CacheGetParams { partition: "kala-static-v2.0".into(), url: "/assets/theme.css".into(), method: None };
        let output: CacheGetOutput = parse(&get_impl(&worker, params).await.unwrap());

        assert_eq!(output.url, "https://store.example/assets/theme.css");
        assert_eq!(output.key_hash, key.hash);
        assert_eq!(output.status, 200);
        assert_eq!(output.body, "body { margin: 0 }");
    }
}

//! cache_keys tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{CacheDb, Error};

use crate::tools::json_result;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Physical partition name, e.g. "kala-dynamic-v2.0".
    pub partition: String,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub partition: String,
    /// Stored request URLs, oldest first.
    pub urls: Vec<String>,
}

/// Implementation of the cache_keys tool.
pub async fn keys_impl(cache: &CacheDb, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    if !cache.has_partition(&params.partition).await? {
        return Err(Error::InvalidInput(format!("unknown partition: {}", params.partition)).into());
    }

    let urls = cache.entry_urls(&params.partition).await?;
    json_result(&CacheKeysOutput { partition: params.partition, urls })
}

//! sw_status tool implementation.
//!
//! Reports the worker's lifecycle state and the partitions in the store.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Fetcher, Worker};
use shellcache_core::cache::PartitionInfo;

use super::json_result;

/// Output from the sw_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwStatusOutput {
    /// installing, waiting, active or terminated.
    pub state: String,
    pub clients_claimed: bool,
    /// Physical names of the current-generation partitions.
    pub current_partitions: Vec<String>,
    /// Every partition present in the store.
    pub partitions: Vec<PartitionInfo>,
}

/// Implementation of the sw_status tool.
pub async fn status_impl<F: Fetcher>(worker: &Worker<F>) -> Result<CallToolResult, McpError> {
    let router = worker.router();
    let partitions = router.store_handle().partition_infos().await?;

    let output = SwStatusOutput {
        state: worker.state().to_string(),
        clients_claimed: worker.clients_claimed(),
        current_partitions: router.config().partitions.all().iter().map(|s| s.to_string()).collect(),
        partitions,
    };

    json_result(&output)
}

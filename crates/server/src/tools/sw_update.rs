//! sw_update tool implementation.
//!
//! Installs a fresh worker over the same store while the current one keeps
//! serving. Only a successful install is activated and swapped in.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_client::{Fetcher, Worker};
use tokio::sync::RwLock;

use super::json_result;

/// Output from the sw_update tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwUpdateOutput {
    /// Partition the shell was written to.
    pub partition: String,
    /// Shell URLs cached by the new worker.
    pub cached: Vec<String>,
    /// Old-generation partitions removed on activation.
    pub deleted: Vec<String>,
    pub state: String,
}

/// Implementation of the sw_update tool.
///
/// The install runs without holding the lock, so fetches keep flowing to the
/// current worker; the lock is taken for writing only to activate and swap.
pub async fn update_impl<F: Fetcher>(worker: &RwLock<Worker<F>>) -> Result<CallToolResult, McpError> {
    let mut next = Worker::new(worker.read().await.router().successor());
    let installed = next.install().await?;

    let mut current = worker.write().await;
    let activated = next.activate().await?;
    let mut retired = std::mem::replace(&mut *current, next);
    retired.terminate();

    let output = SwUpdateOutput {
        partition: installed.partition,
        cached: installed.cached,
        deleted: activated.deleted,
        state: current.state().to_string(),
    };
    drop(current);

    json_result(&output)
}

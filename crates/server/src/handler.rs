//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache::{CacheGetParams, CacheKeysParams, CachePurgeParams, get_impl, keys_impl, purge_impl};
use crate::tools::sw_fetch::{SwFetchParams, fetch_impl};
use crate::tools::sw_status::status_impl;
use crate::tools::sw_update::update_impl;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use shellcache_client::{FetchClient, Worker};
use tokio::sync::RwLock;

/// The main MCP server handler for shellcache.
#[derive(Clone)]
pub struct ShellCacheServer {
    tool_router: ToolRouter<Self>,
    /// Fetch and inspection tools share a read lock; lifecycle changes take the write lock.
    worker: Arc<RwLock<Worker<FetchClient>>>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl ShellCacheServer {
    /// Create a new server handler around an installed worker.
    pub fn new(worker: Worker<FetchClient>) -> Self {
        Self { tool_router: Self::tool_router(), worker: Arc::new(RwLock::new(worker)) }
    }

    /// Route one request through the worker.
    ///
    /// Requests the worker declines are fetched directly from the network.
    #[tool(
        description = "Fetch a URL through the service worker. Reports whether it was intercepted, its classification, and whether the response came from the network, a cache partition, or an offline fallback."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&*self.worker.read().await, &params.0).await
    }

    #[tool(description = "Report the worker lifecycle state and the cache partitions with their entry counts.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&*self.worker.read().await).await
    }

    /// Install a new worker generation and swap it in once it activates.
    #[tool(
        description = "Re-install the shell as a new worker. On success it activates, purges old partitions and replaces the running worker; on failure the running worker keeps serving."
    )]
    async fn sw_update(&self) -> Result<CallToolResult, McpError> {
        update_impl(&self.worker).await
    }

    /// Read one stored response.
    #[tool(description = "Read a stored response from a cache partition by URL. Never touches the network.")]
    async fn cache_get(&self, params: Parameters<CacheGetParams>) -> Result<CallToolResult, McpError> {
        get_impl(&*self.worker.read().await, params.0).await
    }

    #[tool(description = "List the request URLs stored in a cache partition.")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        let worker = self.worker.read().await;
        keys_impl(worker.router().store_handle(), params.0).await
    }

    /// Trim a partition.
    ///
    /// At least one of url_pattern or max_entries must be specified.
    #[tool(description = "Purge entries from a cache partition by URL substring and/or keep only the newest N entries.")]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        let worker = self.worker.read().await;
        purge_impl(worker.router().store_handle(), &params.0).await
    }
}

impl ServerHandler for ShellCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "shellcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

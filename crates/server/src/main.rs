//! shellcache server entry point.
//!
//! Loads configuration, opens the partition store, installs and activates
//! the worker (or resumes the persisted generation when the install cannot
//! reach the network), then serves MCP tools on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use shellcache_client::{CacheRouter, FetchClient, FetchConfig, RouterConfig, Worker};
use shellcache_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        db_path = %config.db_path.display(),
        origin = %config.origin,
        "Starting shellcache server on stdio transport"
    );

    let db = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let router = CacheRouter::new(RouterConfig::from_app_config(&config)?, db, fetcher);

    let mut worker = Worker::new(router);
    let worker = match worker.install().await {
        Ok(installed) => {
            tracing::info!(partition = %installed.partition, cached = installed.cached.len(), "worker installed");
            let activated = worker.activate().await?;
            tracing::info!(deleted = ?activated.deleted, "worker activated");
            worker
        }
        Err(e) => {
            tracing::error!(error = %e, "install failed, resuming persisted generation");
            Worker::resume(worker.router().successor()).await?
        }
    };

    let handler = handler::ShellCacheServer::new(worker);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}

//! Worker lifecycle as an explicit state machine.
//!
//! ```text
//! Installing --install ok--> Waiting --activate--> Active <--resume-- (persisted store)
//!     |                                              |
//!     +--install failed--> Terminated <--terminate---+
//! ```
//!
//! A failed install never touches existing partitions, so whatever version
//! activated before keeps serving from its own generation. [`Worker::resume`]
//! picks up that generation again after a restart without the network.

use serde::Serialize;
use shellcache_core::{CacheKey, CachedResponse, Error};

use super::config::PartitionKind;
use super::{CacheRouter, Interception};
use crate::fetch::{Fetcher, canonicalize};
use crate::request::{Destination, RouteRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Installing,
    Waiting,
    Active,
    Terminated,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Shell routes stored by a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub partition: String,
    pub cached: Vec<String>,
}

/// Outcome of activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Old-generation partitions that were deleted.
    pub deleted: Vec<String>,
    pub clients_claimed: bool,
}

/// One version of the router plus its lifecycle state.
pub struct Worker<F> {
    router: CacheRouter<F>,
    state: LifecycleState,
    clients_claimed: bool,
}

impl<F: Fetcher> Worker<F> {
    pub fn new(router: CacheRouter<F>) -> Self {
        Self { router, state: LifecycleState::Installing, clients_claimed: false }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn router(&self) -> &CacheRouter<F> {
        &self.router
    }

    /// Whether this worker controls already-open clients.
    pub fn clients_claimed(&self) -> bool {
        self.clients_claimed
    }

    fn require(&self, expected: LifecycleState, action: &'static str) -> Result<(), Error> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition { action, state: self.state.to_string() })
        }
    }

    /// Pre-cache the shell into the static partition.
    ///
    /// All shell routes are fetched before any is stored; one failure aborts
    /// the install and terminates this worker.
    pub async fn install(&mut self) -> Result<InstallReport, Error> {
        self.require(LifecycleState::Installing, "install")?;
        tracing::info!(assets = self.router.config().shell_assets.len(), "installing");

        match self.precache_shell().await {
            Ok(report) => {
                self.state = LifecycleState::Waiting;
                tracing::info!(partition = %report.partition, cached = report.cached.len(), "installed");
                Ok(report)
            }
            Err(e) => {
                self.state = LifecycleState::Terminated;
                tracing::error!(error = %e, "failed to cache shell assets");
                Err(Error::InstallFailed(e.to_string()))
            }
        }
    }

    async fn precache_shell(&self) -> Result<InstallReport, Error> {
        let config = self.router.config();
        let mut fetched: Vec<(CacheKey, CachedResponse)> = Vec::with_capacity(config.shell_assets.len());

        for path in &config.shell_assets {
            let url = canonicalize(path, Some(&config.origin)).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
            let request = RouteRequest::get(url).with_destination(Destination::Document);
            let response = self.router.fetcher().fetch(&request).await?;
            if !response.is_success() {
                return Err(Error::Network(format!("{path}: status {}", response.status.as_u16())));
            }
            fetched.push((request.cache_key(), super::to_cached(&response)));
        }

        let db = self.router.store_handle();
        let partition = config.partitions.name(PartitionKind::Static);
        db.open_partition(partition).await?;
        db.put_entries(partition, &fetched, &config.partitions.all()).await?;

        Ok(InstallReport {
            partition: partition.to_string(),
            cached: fetched.into_iter().map(|(key, _)| key.url).collect(),
        })
    }

    /// Serve the generation already persisted in the store, skipping install.
    ///
    /// Requires the current static partition to exist and every shell route
    /// to be held by a current partition (a page fetched since install lives
    /// in the dynamic one). The worker starts `Active` with clients claimed.
    pub async fn resume(router: CacheRouter<F>) -> Result<Self, Error> {
        let config = router.config();
        let db = router.store_handle();

        if !db.has_partition(config.partitions.name(PartitionKind::Static)).await? {
            return Err(Error::InstallFailed("no persisted generation to resume".into()));
        }

        let mut missing = Vec::new();
        for path in &config.shell_assets {
            let url = canonicalize(path, Some(&config.origin)).map_err(|e| Error::InvalidUrl(format!("{path}: {e}")))?;
            let holders = db.partitions_holding(&RouteRequest::get(url).cache_key()).await?;
            if !holders.iter().any(|name| config.partitions.is_current(name)) {
                missing.push(path.as_str());
            }
        }
        if !missing.is_empty() {
            return Err(Error::InstallFailed(format!("persisted shell incomplete, missing {}", missing.join(", "))));
        }

        tracing::info!(partitions = ?config.partitions.all(), "resumed persisted generation");
        Ok(Self { router, state: LifecycleState::Active, clients_claimed: true })
    }

    /// Delete every partition outside the current generation and start
    /// controlling clients.
    pub async fn activate(&mut self) -> Result<ActivationReport, Error> {
        self.require(LifecycleState::Waiting, "activate")?;
        tracing::info!("activating");

        let db = self.router.store_handle();
        let mut deleted = Vec::new();
        for name in db.partition_names().await? {
            if self.router.config().partitions.is_current(&name) {
                continue;
            }
            tracing::info!(partition = %name, "deleting old cache");
            db.delete_partition(&name).await?;
            deleted.push(name);
        }

        self.state = LifecycleState::Active;
        self.clients_claimed = true;
        tracing::info!(deleted = deleted.len(), "activated");

        Ok(ActivationReport { deleted, clients_claimed: self.clients_claimed })
    }

    /// Offer a request to the worker. Only an active worker intercepts.
    pub async fn handle_fetch(&self, request: &RouteRequest) -> Result<Interception, Error> {
        if self.state != LifecycleState::Active {
            return Ok(Interception::PassThrough);
        }
        self.router.route(request).await
    }

    /// Retire this worker. Running background refreshes finish; no new ones start.
    pub fn terminate(&mut self) {
        if self.state != LifecycleState::Terminated {
            tracing::info!(from = %self.state, "terminating");
        }
        self.state = LifecycleState::Terminated;
        self.clients_claimed = false;
        self.router.stop_refreshes();
    }
}

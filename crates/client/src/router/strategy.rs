//! Caching strategies and their binding to request kinds.

use shellcache_core::{CacheKey, Error};

use super::CacheRouter;
use super::classify::RequestKind;
use super::config::PartitionKind;
use super::fallback;
use super::response::RouteResponse;
use crate::fetch::Fetcher;
use crate::request::RouteRequest;

/// How a request kind is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Serve cached immediately, refresh in the background; placeholder when nothing is available.
    StaleWhileRevalidate,
    /// Serve cached; network only on a miss, failures propagate.
    CacheFirst,
    /// Network, then cache on failure; failures with no cache propagate.
    NetworkFirst,
    /// As `NetworkFirst`, but degrades to the shell entry or the offline page.
    NetworkFirstWithOfflinePage,
}

impl Strategy {
    pub fn for_kind(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Image => Self::StaleWhileRevalidate,
            RequestKind::StaticAsset => Self::CacheFirst,
            RequestKind::Api => Self::NetworkFirst,
            RequestKind::Page => Self::NetworkFirstWithOfflinePage,
        }
    }
}

impl<F: Fetcher> CacheRouter<F> {
    pub(super) async fn apply(&self, strategy: Strategy, request: &RouteRequest) -> Result<RouteResponse, Error> {
        match strategy {
            Strategy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::NetworkFirstWithOfflinePage => self.network_first_with_offline_page(request).await,
        }
    }

    async fn stale_while_revalidate(&self, request: &RouteRequest) -> Result<RouteResponse, Error> {
        let key = request.cache_key();

        if let Some(cached) = self.lookup(PartitionKind::Image, &key).await {
            let response = RouteResponse::from_cache(cached);
            self.spawn_refresh(request.clone(), key);
            return Ok(response);
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.store(PartitionKind::Image, &key, &response).await;
                Ok(RouteResponse::from_network(&response))
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "image unavailable, serving placeholder");
                Ok(fallback::offline_image())
            }
        }
    }

    /// Refresh an image entry without holding up the caller.
    ///
    /// Spawned only once the cached response is built, and the task yields
    /// before fetching, so the caller's routing future completes with the
    /// cached response before the refresh request goes out. On a
    /// current-thread runtime this ordering is strict.
    fn spawn_refresh(&self, request: RouteRequest, key: CacheKey) {
        if !self.accepts_refreshes() {
            return;
        }

        let router = self.clone();
        self.refreshes.spawn(async move {
            tokio::task::yield_now().await;
            match router.fetcher.fetch(&request).await {
                Ok(response) => router.store(PartitionKind::Image, &key, &response).await,
                Err(e) => tracing::debug!(url = %request.url, error = %e, "background refresh failed"),
            }
        });
    }

    async fn cache_first(&self, request: &RouteRequest) -> Result<RouteResponse, Error> {
        let key = request.cache_key();

        if let Some(cached) = self.lookup(PartitionKind::Static, &key).await {
            return Ok(RouteResponse::from_cache(cached));
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.store(PartitionKind::Static, &key, &response).await;
                Ok(RouteResponse::from_network(&response))
            }
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "failed to fetch static asset");
                Err(e)
            }
        }
    }

    async fn network_first(&self, request: &RouteRequest) -> Result<RouteResponse, Error> {
        let key = request.cache_key();

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.store(PartitionKind::Dynamic, &key, &response).await;
                Ok(RouteResponse::from_network(&response))
            }
            Err(e) => match self.lookup(PartitionKind::Dynamic, &key).await {
                Some(cached) => Ok(RouteResponse::from_cache(cached)),
                None => Err(e),
            },
        }
    }

    async fn network_first_with_offline_page(&self, request: &RouteRequest) -> Result<RouteResponse, Error> {
        match self.network_first(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                // Shell routes were stored at install time in the static partition.
                if let Some(shell) = self.lookup(PartitionKind::Static, &request.cache_key()).await {
                    return Ok(RouteResponse::from_cache(shell));
                }
                tracing::debug!(url = %request.url, error = %e, "offline with no cached page");
                Ok(fallback::offline_page(&self.config.store_name))
            }
        }
    }
}

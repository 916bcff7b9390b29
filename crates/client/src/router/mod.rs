//! The cache router: decides whether and how each request is cached.
//!
//! ### Dispatch
//! 1. Non-GET requests and requests matching the exclusion rules pass
//!    through untouched.
//! 2. Everything else is classified into a [`RequestKind`], which binds a
//!    [`Strategy`] and a partition.
//! 3. The strategy produces the response from network and/or cache.
//!
//! ### Partition store
//! - Reads that fail are treated as misses.
//! - Writes are best effort: only 2xx network responses are stored, and a
//!   failed write never affects the response already produced.
//!
//! ### Lifecycle
//! - [`Worker`] wraps a router in the install/activate/fetch state machine.

mod classify;
mod config;
mod fallback;
mod lifecycle;
mod response;
mod rules;
mod strategy;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shellcache_core::{CacheDb, CacheKey, CachedResponse, Error};
use tokio_util::task::TaskTracker;

pub use classify::RequestKind;
pub use config::{PartitionKind, PartitionNames, RouterConfig};
pub use fallback::{OFFLINE_IMAGE_SVG, offline_image, offline_page, offline_title};
pub use lifecycle::{ActivationReport, InstallReport, LifecycleState, Worker};
pub use response::{ResponseSource, RouteResponse};
use response::to_cached;
pub use rules::{ExclusionRules, is_cacheable_method};
pub use strategy::Strategy;

use crate::fetch::{FetchResponse, Fetcher};
use crate::request::RouteRequest;

/// Result of offering a request to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Not the router's business; the host performs the request itself.
    PassThrough,
    Handled { kind: RequestKind, response: RouteResponse },
}

impl Interception {
    pub fn response(&self) -> Option<&RouteResponse> {
        match self {
            Self::PassThrough => None,
            Self::Handled { response, .. } => Some(response),
        }
    }

    pub fn into_response(self) -> Option<RouteResponse> {
        match self {
            Self::PassThrough => None,
            Self::Handled { response, .. } => Some(response),
        }
    }
}

/// Request interceptor over the three partitions.
pub struct CacheRouter<F> {
    config: Arc<RouterConfig>,
    db: CacheDb,
    fetcher: Arc<F>,
    refreshes: TaskTracker,
    accepting: Arc<AtomicBool>,
}

impl<F> Clone for CacheRouter<F> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            fetcher: self.fetcher.clone(),
            refreshes: self.refreshes.clone(),
            accepting: self.accepting.clone(),
        }
    }
}

impl<F: Fetcher> CacheRouter<F> {
    pub fn new(config: RouterConfig, db: CacheDb, fetcher: F) -> Self {
        Self {
            config: Arc::new(config),
            db,
            fetcher: Arc::new(fetcher),
            refreshes: TaskTracker::new(),
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn store_handle(&self) -> &CacheDb {
        &self.db
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Whether `request` is eligible for interception at all.
    pub fn intercepts(&self, request: &RouteRequest) -> bool {
        is_cacheable_method(&request.method) && !self.config.exclusions.matches(&request.url)
    }

    /// Route one request.
    ///
    /// # Errors
    ///
    /// Propagates the network error for a static asset that is neither cached
    /// nor fetchable, and for API requests with no network and no cache entry.
    pub async fn route(&self, request: &RouteRequest) -> Result<Interception, Error> {
        if !self.intercepts(request) {
            tracing::debug!(method = %request.method, url = %request.url, "pass through");
            return Ok(Interception::PassThrough);
        }

        let kind = RequestKind::classify(request);
        let strategy = Strategy::for_kind(kind);
        tracing::debug!(url = %request.url, %kind, ?strategy, "routing");

        let response = self.apply(strategy, request).await?;
        Ok(Interception::Handled { kind, response })
    }

    /// Wait until every background refresh started so far has finished.
    pub async fn settle(&self) {
        self.refreshes.close();
        self.refreshes.wait().await;
        self.refreshes.reopen();
    }

    pub(crate) fn stop_refreshes(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    pub(crate) fn accepts_refreshes(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    async fn lookup(&self, kind: PartitionKind, key: &CacheKey) -> Option<CachedResponse> {
        let partition = self.config.partitions.name(kind);
        match self.db.match_entry(partition, key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(partition, url = %key.url, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a 2xx network response in the partition bound to `kind`,
    /// dropping the same key from the other current partitions so a key
    /// never lives in two of them (install-time shell entries included).
    async fn store(&self, kind: PartitionKind, key: &CacheKey, response: &FetchResponse) {
        if !response.is_success() {
            return;
        }

        let partition = self.config.partitions.name(kind);
        let entry = [(key.clone(), to_cached(response))];
        let result: Result<(), Error> = async {
            self.db.open_partition(partition).await?;
            self.db.put_entries(partition, &entry, &self.config.partitions.all()).await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(partition, url = %key.url, error = %e, "cache write failed");
        }
    }

    /// A router over the same store, network and configuration with its own
    /// background refresh tracking, for the next worker generation.
    pub fn successor(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            fetcher: self.fetcher.clone(),
            refreshes: TaskTracker::new(),
            accepting: Arc::new(AtomicBool::new(true)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{self, ScriptedFetcher};
    use super::*;
    use reqwest::Method;
    use std::time::Duration;

    fn handled(interception: Interception) -> (RequestKind, RouteResponse) {
        match interception {
            Interception::Handled { kind, response } => (kind, response),
            Interception::PassThrough => panic!("expected the router to handle the request"),
        }
    }

    async fn stored(
        router: &CacheRouter<Arc<ScriptedFetcher>>, kind: PartitionKind, request: &RouteRequest,
    ) -> Option<CachedResponse> {
        router
            .store_handle()
            .match_entry(router.config().partitions.name(kind), &request.cache_key())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_non_get_passes_through() {
        let (router, fetcher) = testing::router().await;
        let request = RouteRequest::new(Method::POST, testing::get("/products/1.json").url);

        assert_eq!(router.route(&request).await.unwrap(), Interception::PassThrough);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn test_excluded_paths_pass_through() {
        let (router, fetcher) = testing::router().await;

        for path in ["/admin", "/checkout", "/cart/add.js", "/cart"] {
            assert_eq!(router.route(&testing::get(path)).await.unwrap(), Interception::PassThrough);
        }

        assert_eq!(fetcher.calls(), 0);
        assert!(router.store_handle().partition_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_excluded_host_passes_through() {
        let (router, _) = testing::router().await;
        let request = RouteRequest::get(url::Url::parse("https://cdn.shopify.com/s/files/logo.png").unwrap());
        assert_eq!(router.route(&request).await.unwrap(), Interception::PassThrough);
    }

    #[tokio::test]
    async fn test_image_miss_fetches_and_stores() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/files/ring.png");

        let (kind, response) = handled(router.route(&request).await.unwrap());

        assert_eq!(kind, RequestKind::Image);
        assert_eq!(response.source, ResponseSource::Network);
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(stored(&router, PartitionKind::Image, &request).await.unwrap().body, response.body.to_vec());
    }

    #[tokio::test]
    async fn test_image_hit_returns_cached_then_refreshes() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/files/ring.png");
        router.route(&request).await.unwrap();

        fetcher.respond(request.url.as_str(), 200, "fresh pixels");
        let gate = fetcher.hold();

        let (_, response) = handled(router.route(&request).await.unwrap());
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.body_text(), format!("body of {}", request.url));

        gate.notify_one();
        router.settle().await;

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(stored(&router, PartitionKind::Image, &request).await.unwrap().body, b"fresh pixels");
    }

    #[tokio::test]
    async fn test_image_refresh_fetches_after_cached_response() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/files/ring.png");
        router.route(&request).await.unwrap();

        let (_, response) = handled(router.route(&request).await.unwrap());
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(fetcher.calls(), 1, "refresh must not fetch before the cached response is returned");

        router.settle().await;
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_image_hit_does_not_wait_for_refresh() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/files/ring.png");
        router.route(&request).await.unwrap();

        let _gate = fetcher.hold();
        let routed = tokio::time::timeout(Duration::from_secs(5), router.route(&request)).await;

        let (_, response) = handled(routed.expect("cached image must not wait on the refresh").unwrap());
        assert_eq!(response.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_image_refresh_failure_is_swallowed() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/files/ring.png");
        router.route(&request).await.unwrap();

        fetcher.set_online(false);
        let (_, response) = handled(router.route(&request).await.unwrap());
        router.settle().await;

        assert_eq!(response.source, ResponseSource::Cache);
        assert!(stored(&router, PartitionKind::Image, &request).await.is_some());
    }

    #[tokio::test]
    async fn test_image_offline_miss_serves_placeholder() {
        let (router, fetcher) = testing::router().await;
        fetcher.set_online(false);
        let request = testing::get("/files/ring.png");

        let (_, response) = handled(router.route(&request).await.unwrap());

        assert_eq!(response.source, ResponseSource::Fallback);
        assert_eq!(response.body_text(), OFFLINE_IMAGE_SVG);
        assert_eq!(response.header("cache-control"), Some("no-cache"));
        assert!(stored(&router, PartitionKind::Image, &request).await.is_none());
    }

    #[tokio::test]
    async fn test_static_hit_skips_network() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/assets/theme.js");

        router.route(&request).await.unwrap();
        let (kind, response) = handled(router.route(&request).await.unwrap());

        assert_eq!(kind, RequestKind::StaticAsset);
        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_static_offline_miss_fails() {
        let (router, fetcher) = testing::router().await;
        fetcher.set_online(false);

        let result = router.route(&testing::get("/assets/theme.js")).await;
        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn test_non_success_is_returned_but_not_stored() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/assets/missing.css");
        fetcher.respond(request.url.as_str(), 404, "not found");

        let (_, response) = handled(router.route(&request).await.unwrap());

        assert_eq!(response.status, 404);
        assert!(stored(&router, PartitionKind::Static, &request).await.is_none());
    }

    #[tokio::test]
    async fn test_page_and_api_store_network_response() {
        let (router, _) = testing::router().await;

        for (path, expected) in [("/collections/rings", RequestKind::Page), ("/products/1.json", RequestKind::Api)] {
            let request = testing::get(path);
            let (kind, response) = handled(router.route(&request).await.unwrap());

            assert_eq!(kind, expected);
            assert_eq!(response.source, ResponseSource::Network);
            let cached = stored(&router, PartitionKind::Dynamic, &request).await.unwrap();
            assert_eq!(cached.body, response.body.to_vec());
        }
    }

    #[tokio::test]
    async fn test_api_offline_falls_back_to_cache() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/api/cart-count");
        router.route(&request).await.unwrap();

        fetcher.set_online(false);
        let (_, response) = handled(router.route(&request).await.unwrap());

        assert_eq!(response.source, ResponseSource::Cache);
    }

    #[tokio::test]
    async fn test_api_offline_without_cache_fails() {
        let (router, fetcher) = testing::router().await;
        fetcher.set_online(false);

        assert!(router.route(&testing::get("/search/suggest?q=gold")).await.is_err());
    }

    #[tokio::test]
    async fn test_page_offline_without_cache_serves_offline_page() {
        let (router, fetcher) = testing::router().await;
        fetcher.set_online(false);

        let (kind, response) = handled(router.route(&testing::get("/pages/faq")).await.unwrap());

        assert_eq!(kind, RequestKind::Page);
        assert_eq!(response.source, ResponseSource::Fallback);
        assert!(response.body_text().contains("<title>Offline - Kala Aabharanam</title>"));
        assert_eq!(response.header("cache-control"), Some("no-cache"));
    }

    #[tokio::test]
    async fn test_page_offline_uses_shell_entry() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/search");
        let shell = router.store_handle().open_partition("kala-static-v2.0").await.unwrap();
        shell
            .put(&request.cache_key(), &CachedResponse { status: 200, headers: Vec::new(), body: b"shell".to_vec() })
            .await
            .unwrap();

        fetcher.set_online(false);
        let (_, response) = handled(router.route(&request).await.unwrap());

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(response.body_text(), "shell");
    }

    #[tokio::test]
    async fn test_repeat_requests_converge() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/products/1.json");

        let (_, first) = handled(router.route(&request).await.unwrap());
        let (_, second) = handled(router.route(&request).await.unwrap());

        assert_eq!(fetcher.calls(), 2);
        assert_eq!(first.body, second.body);
        assert_eq!(router.store_handle().count_entries("kala-dynamic-v2.0").await.unwrap(), 1);
        assert_eq!(stored(&router, PartitionKind::Dynamic, &request).await.unwrap().body, second.body.to_vec());
    }

    #[tokio::test]
    async fn test_each_key_lands_in_one_partition() {
        let (router, _) = testing::router().await;
        let paths = ["/", "/collections/all", "/files/a.png", "/styles/app.css", "/products/1.json", "/fonts/a.woff"];

        for path in paths {
            router.route(&testing::get(path)).await.unwrap();
        }
        router.settle().await;

        for path in paths {
            let holders = router.store_handle().partitions_holding(&testing::get(path).cache_key()).await.unwrap();
            assert_eq!(holders.len(), 1, "{path} stored in {holders:?}");
        }
    }

    #[tokio::test]
    async fn test_page_fetch_replaces_shell_entry() {
        let (router, _) = testing::router().await;
        let request = testing::get("/");
        let shell = router.store_handle().open_partition("kala-static-v2.0").await.unwrap();
        shell
            .put(&request.cache_key(), &CachedResponse { status: 200, headers: Vec::new(), body: b"shell".to_vec() })
            .await
            .unwrap();

        router.route(&request).await.unwrap();

        let holders = router.store_handle().partitions_holding(&request.cache_key()).await.unwrap();
        assert_eq!(holders, vec!["kala-dynamic-v2.0"]);
    }

    #[tokio::test]
    async fn test_successor_refreshes_independently() {
        let (router, fetcher) = testing::router().await;
        let request = testing::get("/files/ring.png");
        router.route(&request).await.unwrap();

        let next = router.successor();
        router.stop_refreshes();
        next.route(&request).await.unwrap();
        next.settle().await;

        assert!(next.accepts_refreshes());
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_write_failure_is_ignored() {
        let (router, _) = testing::router().await;
        let request = testing::get("/products/2.json");
        // Closing the connection makes every store operation fail.
        router.store_handle().close().await.unwrap();

        let (_, response) = handled(router.route(&request).await.unwrap());
        assert_eq!(response.source, ResponseSource::Network);
    }
}

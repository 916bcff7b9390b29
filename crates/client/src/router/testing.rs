//! Scripted network for router tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{StatusCode, header};
use shellcache_core::{AppConfig, CacheDb, Error};
use tokio::sync::Notify;
use url::Url;

use super::{CacheRouter, RouterConfig};
use crate::fetch::{FetchResponse, Fetcher};
use crate::request::RouteRequest;

pub(crate) const ORIGIN: &str = "https://store.example";

/// Answers every URL with `body of <url>` unless scripted otherwise.
pub(crate) struct ScriptedFetcher {
    online: AtomicBool,
    calls: AtomicUsize,
    scripted: Mutex<HashMap<String, (u16, String)>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
            scripted: Mutex::new(HashMap::new()),
            gate: Mutex::new(None),
        }
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn respond(&self, url: &str, status: u16, body: &str) {
        self.scripted
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_string()));
    }

    /// Hold every fetch until the returned notifier fires.
    pub(crate) fn hold(&self) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(notify.clone());
        notify
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &RouteRequest) -> Result<FetchResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if !self.online.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let (status, body) = self
            .scripted
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| (200, format!("body of {}", request.url)));

        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain"));

        Ok(FetchResponse {
            url: request.url.clone(),
            final_url: request.url.clone(),
            status: StatusCode::from_u16(status).unwrap(),
            content_type: Some("text/plain".into()),
            bytes: Bytes::from(body),
            headers,
            fetch_ms: 1,
        })
    }
}

pub(crate) fn router_config() -> RouterConfig {
    let app = AppConfig { origin: ORIGIN.into(), ..Default::default() };
    RouterConfig::from_app_config(&app).unwrap()
}

pub(crate) async fn router() -> (CacheRouter<Arc<ScriptedFetcher>>, Arc<ScriptedFetcher>) {
    let db = CacheDb::open_in_memory().await.unwrap();
    let fetcher = Arc::new(ScriptedFetcher::new());
    (CacheRouter::new(router_config(), db, fetcher.clone()), fetcher)
}

pub(crate) fn get(path: &str) -> RouteRequest {
    RouteRequest::get(Url::parse(ORIGIN).unwrap().join(path).unwrap())
}

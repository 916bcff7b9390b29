//! Responses produced by the router.

use std::borrow::Cow;

use bytes::Bytes;
use serde::Serialize;
use shellcache_core::CachedResponse;

use crate::fetch::FetchResponse;

/// Where a routed response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Synthesized placeholder or offline page.
    Fallback,
}

impl ResponseSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Cache => "cache",
            Self::Fallback => "fallback",
        }
    }
}

/// A response handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl RouteResponse {
    pub fn from_network(response: &FetchResponse) -> Self {
        Self {
            status: response.status.as_u16(),
            headers: response.header_pairs(),
            body: response.bytes.clone(),
            source: ResponseSource::Network,
        }
    }

    pub fn from_cache(cached: CachedResponse) -> Self {
        Self { status: cached.status, headers: cached.headers, body: Bytes::from(cached.body), source: ResponseSource::Cache }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// Snapshot of a network response as it will be stored.
pub(crate) fn to_cached(response: &FetchResponse) -> CachedResponse {
    CachedResponse { status: response.status.as_u16(), headers: response.header_pairs(), body: response.bytes.to_vec() }
}

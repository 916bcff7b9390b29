//! Outgoing request descriptor seen by the router.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use shellcache_core::CacheKey;
use url::Url;

/// Resource-type hint attached to a request by whoever issued it.
///
/// Mirrors the fetch destination a browser reports; anything unrecognized is
/// `Other`, which never influences classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Image,
    Style,
    Script,
    Font,
    Document,
    #[default]
    Other,
}

impl Destination {
    /// Parse a destination hint. Total: unknown values map to `Other`.
    pub fn parse(hint: &str) -> Self {
        match hint.trim().to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "style" => Self::Style,
            "script" => Self::Script,
            "font" => Self::Font,
            "document" => Self::Document,
            _ => Self::Other,
        }
    }

    /// Accept header sent upstream for this destination.
    pub fn accept_header(self) -> &'static str {
        match self {
            Self::Image => "image/avif,image/webp,image/png,image/svg+xml,image/*;q=0.8,*/*;q=0.5",
            Self::Style => "text/css,*/*;q=0.1",
            Self::Document => "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            Self::Script | Self::Font | Self::Other => "*/*",
        }
    }
}

/// An outgoing HTTP request: method, canonical URL and destination hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub method: Method,
    pub url: Url,
    pub destination: Destination,
}

impl RouteRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, destination: Destination::Other }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Key this request is stored under.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.method.as_str(), self.url.as_str())
    }
}

//! Request classification.
//!
//! Total and stateless: every request maps to exactly one [`RequestKind`].
//! Tests run in a fixed order (image, static asset, api, page) and the first
//! match wins, even where a later category looks like the better fit.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::config::PartitionKind;
use crate::request::{Destination, RouteRequest};

static IMAGE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg)$").expect("valid image pattern"));

static STATIC_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(css|js|woff|woff2|ttf|eot)$").expect("valid asset pattern"));

const API_MARKERS: &[&str] = &["/api/", ".json", "/search/suggest"];

/// Routing category of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Image,
    StaticAsset,
    Api,
    Page,
}

impl RequestKind {
    pub fn classify(request: &RouteRequest) -> Self {
        let url = request.url.as_str();

        if request.destination == Destination::Image || IMAGE_EXTENSION.is_match(url) {
            Self::Image
        } else if matches!(request.destination, Destination::Style | Destination::Script | Destination::Font)
            || STATIC_EXTENSION.is_match(url)
        {
            Self::StaticAsset
        } else if API_MARKERS.iter().any(|marker| url.contains(marker)) {
            Self::Api
        } else {
            Self::Page
        }
    }

    /// Partition this category reads from and writes to.
    pub fn partition(self) -> PartitionKind {
        match self {
            Self::Image => PartitionKind::Image,
            Self::StaticAsset => PartitionKind::Static,
            Self::Api | Self::Page => PartitionKind::Dynamic,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::StaticAsset => "static_asset",
            Self::Api => "api",
            Self::Page => "page",
        }
    }
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

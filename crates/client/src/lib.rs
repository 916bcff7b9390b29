//! Client-side half of shellcache.
//!
//! This crate provides the network fetch pipeline and the cache router that
//! decides, per request, whether and how a response is served from the
//! partition store.

pub mod fetch;
pub mod request;
pub mod router;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher, canonicalize};
pub use request::{Destination, RouteRequest};
pub use reqwest::header::HeaderMap;
pub use reqwest::{Method, StatusCode};
pub use router::{
    ActivationReport, CacheRouter, ExclusionRules, InstallReport, Interception, LifecycleState, PartitionKind,
    PartitionNames, RequestKind, ResponseSource, RouteResponse, RouterConfig, Strategy, Worker,
};

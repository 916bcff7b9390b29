//! Core types and shared functionality for shellcache.
//!
//! This crate provides:
//! - Partitioned response store with SQLite backend
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheKey, CachedResponse, Partition};
pub use config::{AppConfig, ConfigError, PartitionSettings};
pub use error::Error;

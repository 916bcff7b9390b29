//! SQLite-backed partitioned response store.
//!
//! This module provides the persistent key -> response mapping the router
//! reads and writes, using SQLite with async access via tokio-rusqlite:
//!
//! - Named partitions whose names carry a generation tag
//! - Entries keyed by a SHA-256 hash of method + canonical URL
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Whole-partition deletion for generation upgrades

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod partitions;

pub use crate::Error;

pub use connection::CacheDb;
pub use entries::CachedResponse;
pub use hash::CacheKey;
pub use partitions::{Partition, PartitionInfo};

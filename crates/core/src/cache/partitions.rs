//! Named partitions and the `Partition` handle.
//!
//! A partition exists from the moment it is opened until it is deleted.
//! Deleting a partition cascades to all of its entries, which is the only
//! invalidation mechanism: there is no per-entry expiry.

use super::connection::CacheDb;
use super::entries::CachedResponse;
use super::hash::CacheKey;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Partition name with its current entry count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PartitionInfo {
    pub name: String,
    pub entries: u64,
}

impl CacheDb {
    /// Open (creating if needed) the partition called `name`.
    pub async fn open_partition(&self, name: &str) -> Result<Partition, Error> {
        let owned = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO partitions (name, created_at) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
                    params![owned, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Partition { db: self.clone(), name: name.to_string() })
    }

    /// Names of all partitions, in creation order.
    pub async fn partition_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// All partitions with their entry counts, in creation order.
    pub async fn partition_infos(&self) -> Result<Vec<PartitionInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<PartitionInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT p.name, COUNT(e.key_hash)
                    FROM partitions p LEFT JOIN entries e ON e.partition = p.name
                    GROUP BY p.name ORDER BY p.rowid",
                )?;
                let infos = stmt
                    .query_map([], |row| {
                        Ok(PartitionInfo { name: row.get(0)?, entries: row.get::<_, i64>(1)? as u64 })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a partition called `name` exists.
    pub async fn has_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a partition and every entry in it.
    ///
    /// Returns whether the partition existed.
    pub async fn delete_partition(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM entries WHERE partition = ?1", params![name])?;
                let count = tx.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                tx.commit()?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}

/// Handle to one open partition.
///
/// Cheap to clone; all clones share the underlying store.
#[derive(Clone, Debug)]
pub struct Partition {
    db: CacheDb,
    name: String,
}

impl Partition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored response for `key`, if any.
    pub async fn match_request(&self, key: &CacheKey) -> Result<Option<CachedResponse>, Error> {
        self.db.match_entry(&self.name, key).await
    }

    /// Store `response` under `key`, replacing any previous entry.
    pub async fn put(&self, key: &CacheKey, response: &CachedResponse) -> Result<(), Error> {
        self.db.put_entry(&self.name, key, response).await
    }

    pub async fn delete(&self, key: &CacheKey) -> Result<bool, Error> {
        self.db.delete_entry(&self.name, key).await
    }

    /// URLs stored in this partition.
    pub async fn keys(&self) -> Result<Vec<String>, Error> {
        self.db.entry_urls(&self.name).await
    }

    pub async fn count(&self) -> Result<u64, Error> {
        self.db.count_entries(&self.name).await
    }
}

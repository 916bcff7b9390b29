//! Entry operations: the per-partition key -> response mapping.
//!
//! Entries are immutable once written; a put always replaces the whole row,
//! so concurrent writers of the same key converge on last-write-wins.

use super::connection::CacheDb;
use super::hash::CacheKey;
use crate::Error;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A captured response as stored in a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

const UPSERT_ENTRY: &str = "INSERT INTO entries (partition, key_hash, method, url, status, headers_json, body, stored_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(partition, key_hash) DO UPDATE SET
        method = excluded.method,
        url = excluded.url,
        status = excluded.status,
        headers_json = excluded.headers_json,
        body = excluded.body,
        stored_at = excluded.stored_at";

/// A response serialized into column values, ready to bind.
struct EntryRow {
    key: CacheKey,
    status: i64,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn new(key: &CacheKey, response: &CachedResponse) -> Result<Self, Error> {
        Ok(Self {
            key: key.clone(),
            status: i64::from(response.status),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.clone(),
        })
    }

    fn upsert(&self, conn: &rusqlite::Connection, partition: &str, stored_at: &str) -> rusqlite::Result<usize> {
        conn.execute(
            UPSERT_ENTRY,
            params![
                partition,
                self.key.hash,
                self.key.method,
                self.key.url,
                self.status,
                self.headers_json,
                self.body,
                stored_at
            ],
        )
    }
}

fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl CacheDb {
    /// Insert or replace an entry in `partition`.
    ///
    /// The partition must already exist; writes into a deleted partition fail.
    pub async fn put_entry(&self, partition: &str, key: &CacheKey, response: &CachedResponse) -> Result<(), Error> {
        let partition = partition.to_string();
        let row = EntryRow::new(key, response)?;
        let stored_at = now_stamp();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                row.upsert(conn, &partition, &stored_at)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Write a batch of entries into `partition` in one transaction, removing
    /// the same keys from every partition named in `evict_from`.
    ///
    /// Either every entry is written and evicted, or nothing changes.
    pub async fn put_entries(
        &self, partition: &str, entries: &[(CacheKey, CachedResponse)], evict_from: &[&str],
    ) -> Result<(), Error> {
        let partition = partition.to_string();
        let rows = entries
            .iter()
            .map(|(key, response)| EntryRow::new(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let evict_from: Vec<String> = evict_from
            .iter()
            .filter(|name| **name != partition)
            .map(|name| name.to_string())
            .collect();
        let stored_at = now_stamp();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                for row in &rows {
                    row.upsert(&tx, &partition, &stored_at)?;
                    for other in &evict_from {
                        tx.execute(
                            "DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2",
                            params![other, row.key.hash],
                        )?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up an entry in `partition`.
    ///
    /// Returns None if the key isn't stored there.
    pub async fn match_entry(&self, partition: &str, key: &CacheKey) -> Result<Option<CachedResponse>, Error> {
        let partition = partition.to_string();
        let key_hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt =
                    conn.prepare("SELECT status, headers_json, body FROM entries WHERE partition = ?1 AND key_hash = ?2")?;

                let result = stmt.query_row(params![partition, key_hash], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
                });

                match result {
                    Ok((status, headers_json, body)) => {
                        let status =
                            u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status}")))?;
                        let headers = serde_json::from_str(&headers_json)?;
                        Ok(Some(CachedResponse { status, headers, body }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Delete one entry. Returns whether it existed.
    pub async fn delete_entry(&self, partition: &str, key: &CacheKey) -> Result<bool, Error> {
        let partition = partition.to_string();
        let key_hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2",
                    params![partition, key_hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs stored in `partition`, oldest write first.
    pub async fn entry_urls(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT url FROM entries WHERE partition = ?1 ORDER BY stored_at ASC, url ASC")?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in `partition`.
    pub async fn count_entries(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of every partition that holds `key`.
    ///
    /// Writers that evict from the sibling partitions keep this to at most
    /// one name per generation.
    pub async fn partitions_holding(&self, key: &CacheKey) -> Result<Vec<String>, Error> {
        let key_hash = key.hash.clone();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT partition FROM entries WHERE key_hash = ?1 ORDER BY partition")?;
                let names = stmt
                    .query_map(params![key_hash], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete entries in `partition` whose URL contains `pattern`.
    ///
    /// Plain, case-sensitive substring match: `%` and `_` are literal.
    /// Returns the number of deleted entries.
    pub async fn purge_entries_by_url(&self, partition: &str, pattern: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        let pattern = pattern.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND instr(url, ?2) > 0",
                    params![partition, pattern],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Purge the oldest entries of `partition` until count <= max_entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_lru_entries(&self, partition: &str, max_entries: usize) -> Result<u64, Error> {
        let partition = partition.to_string();
        let max = max_entries as i64;
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![partition], |row| {
                        row.get(0)
                    })?;
                if count <= max {
                    return Ok(0);
                }

                let deleted = conn.execute(
                    "DELETE FROM entries WHERE partition = ?1 AND key_hash IN (
                        SELECT key_hash FROM entries WHERE partition = ?1 ORDER BY stored_at ASC LIMIT ?2
                    )",
                    params![partition, count - max],
                )?;
                Ok(deleted as u64)
            })
            .await
            .map_err(Error::from)
    }
}

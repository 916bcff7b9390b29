//! Schema migrations for the partition store.
//!
//! The applied version is kept in SQLite's `user_version` pragma. Each
//! pending step runs in its own transaction together with the version bump,
//! so a failed step leaves the previous schema intact.

use super::Error;
use tokio_rusqlite::Connection;

/// Ordered schema steps. Step `n` moves the schema to `user_version = n + 1`.
const STEPS: &[&str] = &[include_str!("../../migrations/001_partitions.sql")];

/// Latest schema version this build knows about.
pub const SCHEMA_VERSION: i64 = STEPS.len() as i64;

/// Bring the schema up to [`SCHEMA_VERSION`].
///
/// # Errors
///
/// `MigrationFailed` if a step does not apply, or if the database was written
/// by a newer build.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    conn.call(|conn| -> Result<(), Error> {
        let applied: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
        if applied > SCHEMA_VERSION {
            return Err(Error::MigrationFailed(format!(
                "schema version {applied} is newer than supported {SCHEMA_VERSION}"
            )));
        }

        for (index, sql) in STEPS.iter().enumerate().skip(applied as usize) {
            let version = index as i64 + 1;
            let tx = conn.transaction()?;
            tx.execute_batch(sql)
                .map_err(|e| Error::MigrationFailed(format!("step {version}: {e}")))?;
            tx.pragma_update(None, "user_version", version)?;
            tx.commit()?;
            tracing::debug!(version, "applied migration");
        }

        Ok(())
    })
    .await
    .map_err(Error::from)
}

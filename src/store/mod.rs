//! Index Store: the persistent SQLite-backed record of every path this crate
//! has ever seen, plus the config key/value table used to detect a
//! `hash_components` change between runs.

mod queries;
mod schema;

pub use queries::HASH_COMPONENTS_CONFIG_KEY;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::config::RetryConsts;
use crate::error::DupefinderError;
use schema::{SCHEMA, WAL_PRAGMAS};

/// Owns one `rusqlite::Connection` to the index database.
///
/// The Index Store is the only shared mutable resource in the system; a
/// single connection guarded by a mutex is simpler than a connection pool
/// and correct, since SQLite serializes writers on the file anyway.
pub struct IndexStore {
    conn: Connection,
}

/// An `IndexStore` shared across scan/hash-phase worker threads.
pub type SharedIndexStore = Arc<Mutex<IndexStore>>;

impl IndexStore {
    /// Open (or create) the index database at `path`, enabling WAL and applying schema.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("open index database at {}", path.display()))?;
        apply_wal_and_schema(&conn, Some(path))?;
        Ok(IndexStore { conn })
    }

    /// Open an in-memory database with the same schema. Used by tests and by
    /// callers that don't want a database file on disk.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory index database")?;
        conn.execute_batch(SCHEMA).context("create schema")?;
        Ok(IndexStore { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Wrap for sharing across pipeline worker threads.
    pub fn into_shared(self) -> SharedIndexStore {
        Arc::new(Mutex::new(self))
    }

    /// Run `f` against this store's connection, retrying with jittered backoff
    /// on transient `SQLITE_BUSY`/`SQLITE_LOCKED` failures.
    pub(crate) fn with_retry<T>(&self, mut f: impl FnMut(&Connection) -> Result<T, DupefinderError>) -> Result<T> {
        let mut attempt = 0;
        loop {
            match f(&self.conn) {
                Ok(v) => return Ok(v),
                Err(e) if e.is_transient() && attempt < RetryConsts::MAX_ATTEMPTS => {
                    attempt += 1;
                    let backoff = RetryConsts::BASE_BACKOFF_MS * (1 << attempt.min(6));
                    thread::sleep(Duration::from_millis(backoff));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn apply_wal_and_schema(conn: &Connection, db_path: Option<&Path>) -> Result<()> {
    let path_ctx = db_path
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default();
    conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))
        .with_context(|| format!("enable WAL{}", path_ctx))?;
    conn.execute_batch(WAL_PRAGMAS)
        .with_context(|| format!("set WAL pragmas{}", path_ctx))?;
    conn.execute_batch(SCHEMA)
        .with_context(|| format!("create schema{}", path_ctx))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_in_memory_store() {
        let store = IndexStore::open_in_memory().unwrap();
        assert!(store.conn().is_autocommit());
    }
}

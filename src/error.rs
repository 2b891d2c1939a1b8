//! Typed error kinds for code paths that branch on failure kind.
//!
//! Most functions in this crate return `anyhow::Result` (teacher-style ad-hoc
//! context); this enum exists only where a caller needs to distinguish kinds,
//! e.g. the Index Store's busy-retry loop and the Orchestrator's
//! config-mismatch-is-non-fatal branch.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DupefinderError {
    #[error("access denied or I/O error at {path}: {source}")]
    AccessDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("read error while hashing {path}: {source}")]
    HashReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index store error: {0}")]
    IndexStoreError(#[from] rusqlite::Error),

    #[error("hash_components changed since last run; forcing full rescan")]
    ConfigMismatch,

    #[error("cancelled by user")]
    CancelRequested,

    #[error("internal error: {0}")]
    FatalInternal(#[from] anyhow::Error),
}

impl DupefinderError {
    /// True for rusqlite errors worth a bounded retry (SQLITE_BUSY / SQLITE_LOCKED).
    pub fn is_transient(&self) -> bool {
        match self {
            DupefinderError::IndexStoreError(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

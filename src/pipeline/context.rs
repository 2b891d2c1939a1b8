//! Shared pipeline state: progress counters and the cooperative cancellation token.
//!
//! The Index Store is the only other shared mutable resource (see
//! [`crate::store::SharedIndexStore`]); these two are the sole pieces of
//! shared mutable state the concurrency model allows, and both are atomic.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::types::ScanProgress;

/// Atomic running counters for one scan/hash run. Cheap to snapshot from any
/// thread; monotone non-decreasing.
#[derive(Default)]
pub struct ScanCounters {
    pub scanned: AtomicUsize,
    pub updated: AtomicUsize,
    pub skipped_unchanged: AtomicUsize,
    pub skipped_error: AtomicUsize,
}

impl ScanCounters {
    pub fn snapshot(&self) -> ScanProgress {
        ScanProgress {
            scanned: self.scanned.load(Ordering::Relaxed),
            updated: self.updated.load(Ordering::Relaxed),
            skipped_unchanged: self.skipped_unchanged.load(Ordering::Relaxed),
            skipped_error: self.skipped_error.load(Ordering::Relaxed),
        }
    }
}

/// Cooperative cancellation flag. Checked by the enumerator between
/// directories and by workers between files; at-most-once, idempotent.
pub type CancelToken = Arc<AtomicBool>;

/// Install a Ctrl+C handler that flips a shared cancellation flag.
pub fn install_ctrlc_handler() -> Result<CancelToken> {
    let cancel_requested: CancelToken = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&cancel_requested);
    ctrlc::set_handler(move || {
        handler_flag.store(true, Ordering::Relaxed);
    })
    .context("install Ctrl+C handler")?;
    Ok(cancel_requested)
}

/// True once cancellation has been requested.
pub fn is_cancelled(token: &CancelToken) -> bool {
    token.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero_and_snapshot() {
        let counters = ScanCounters::default();
        let snap = counters.snapshot();
        assert_eq!(snap.scanned, 0);
        assert_eq!(snap.updated, 0);
    }

    #[test]
    fn counters_are_monotone() {
        let counters = ScanCounters::default();
        counters.scanned.fetch_add(1, Ordering::Relaxed);
        counters.updated.fetch_add(1, Ordering::Relaxed);
        let a = counters.snapshot();
        counters.scanned.fetch_add(1, Ordering::Relaxed);
        let b = counters.snapshot();
        assert!(b.scanned >= a.scanned);
        assert!(b.updated >= a.updated);
    }
}

//! Progress rendering: wraps the atomic [`super::context::ScanCounters`] in
//! an `indicatif` spinner/bar, polled at roughly fixed intervals.
//!
//! `indicatif::ProgressBar` is itself cheaply cloneable and internally
//! synchronized, so no separate locking is needed to render it from the
//! polling loop while workers update the counters from other threads.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::context::ScanCounters;
use crate::config::ProgressConsts;

/// Create a spinner-style bar for the scan phase (total path count isn't
/// known ahead of time since the enumerator streams paths as it finds them).
pub fn create_scan_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} scanned {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Create a counting bar for the content-hash phase, with a known total
/// (the number of files across all duplicate-size buckets).
pub fn create_hash_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} hashed")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

/// Render the current counters onto `bar`'s message. Call this roughly every
/// [`ProgressConsts::PROGRESS_UPDATE_BATCH_SIZE`] files; the exact cadence is
/// not part of the contract, only that counters are monotone.
pub fn render_scan_progress(bar: &ProgressBar, counters: &Arc<ScanCounters>) {
    let snap = counters.snapshot();
    bar.set_message(format!(
        "{} (updated {}, unchanged {}, errors {})",
        snap.scanned, snap.updated, snap.skipped_unchanged, snap.skipped_error
    ));
}

/// True once `count` has crossed a reporting boundary (used by the scan loop
/// to decide when to call [`render_scan_progress`] without rendering on
/// every single file).
pub fn is_report_boundary(count: usize) -> bool {
    count > 0 && count.is_multiple_of(ProgressConsts::PROGRESS_UPDATE_BATCH_SIZE)
}

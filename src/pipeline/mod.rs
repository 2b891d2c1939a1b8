//! Scan Pipeline: bounded producer/consumer traversal.
//!
//! [`context`] holds the shared atomic state; [`walk`] is the enumerator;
//! [`workers`] is the per-file classification pool; [`content_hash`] is
//! phase-two content hashing; [`progress`] renders the atomic counters.

pub mod content_hash;
pub mod context;
pub mod progress;
pub mod walk;
pub mod workers;

pub use content_hash::run_content_hash_phase;
pub use context::{CancelToken, ScanCounters, install_ctrlc_handler, is_cancelled};
pub use workers::WorkerConfig;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use crossbeam_channel::bounded;
use log::info;

use crate::config::WALK_CHANNEL_CAP;
use crate::store::SharedIndexStore;
use crate::types::HashComponents;

/// Run the full scan phase: spawn the enumerator and worker pool, drain them
/// to completion, and return the final progress snapshot.
///
/// `exclude_path` is typically the index database file itself, so the scan
/// never tries to classify its own catalog.
pub fn run_scan_phase(
    root: &Path,
    exclude_path: Option<&Path>,
    store: &SharedIndexStore,
    components: HashComponents,
    incremental: bool,
    scan_id: i64,
    num_workers: usize,
    follow_links: bool,
    cancel: &CancelToken,
    show_progress: bool,
) -> Result<Arc<ScanCounters>> {
    let (path_tx, path_rx) = bounded::<PathBuf>(WALK_CHANNEL_CAP);
    let counters = Arc::new(ScanCounters::default());

    let enumerator = walk::spawn_enumerator(
        root.to_path_buf(),
        exclude_path.map(|p| p.to_path_buf()),
        path_tx,
        follow_links,
        Arc::clone(cancel),
    );

    let worker_cfg = WorkerConfig {
        store: Arc::clone(store),
        components,
        incremental,
        scan_id,
        counters: Arc::clone(&counters),
        cancel: Arc::clone(cancel),
    };
    let worker_handles = workers::spawn_workers(path_rx, worker_cfg, num_workers.max(1));

    let bar = show_progress.then(progress::create_scan_bar);
    loop {
        let scanned = counters.scanned.load(std::sync::atomic::Ordering::Relaxed);
        if let Some(bar) = &bar
            && progress::is_report_boundary(scanned)
        {
            progress::render_scan_progress(bar, &counters);
        }
        if worker_handles.iter().all(|h| h.is_finished()) {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    let total_paths = enumerator
        .join()
        .map_err(|_| anyhow::anyhow!("enumerator thread panicked"))?;
    for h in worker_handles {
        let _ = h.join();
    }

    if let Some(bar) = &bar {
        progress::render_scan_progress(bar, &counters);
        bar.finish_and_clear();
    }

    let snap = counters.snapshot();
    info!(
        "scan complete: {} paths found, {} scanned, {} updated, {} unchanged, {} errors",
        total_paths, snap.scanned, snap.updated, snap.skipped_unchanged, snap.skipped_error
    );

    Ok(counters)
}

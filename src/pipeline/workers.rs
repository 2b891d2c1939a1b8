//! Worker pool: consumes paths from the bounded queue and performs the
//! per-file classification: probe metadata, compare against the cache,
//! upsert or touch.
//!
//! One thread per worker, `while let Ok(path) = path_rx.recv()`.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use log::warn;

use crate::hashing::composite_hash;
use crate::metadata;
use crate::store::SharedIndexStore;
use crate::types::HashComponents;

use super::context::{CancelToken, ScanCounters, is_cancelled};
use std::sync::Arc;

/// Everything a worker needs that doesn't change across files in this run.
#[derive(Clone)]
pub struct WorkerConfig {
    pub store: SharedIndexStore,
    pub components: HashComponents,
    pub incremental: bool,
    pub scan_id: i64,
    pub counters: Arc<ScanCounters>,
    pub cancel: CancelToken,
}

/// Spawn `num_workers` threads draining `path_rx`. Each worker runs until the
/// channel closes (enumerator dropped its sender) or cancellation is observed.
pub fn spawn_workers(path_rx: Receiver<PathBuf>, cfg: WorkerConfig, num_workers: usize) -> Vec<JoinHandle<()>> {
    (0..num_workers)
        .map(|_| {
            let path_rx = path_rx.clone();
            let cfg = cfg.clone();
            thread::spawn(move || worker_loop(path_rx, cfg))
        })
        .collect()
}

fn worker_loop(path_rx: Receiver<PathBuf>, cfg: WorkerConfig) {
    while let Ok(path) = path_rx.recv() {
        if is_cancelled(&cfg.cancel) {
            break;
        }
        classify_one(&path, &cfg);
        cfg.counters.scanned.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }
}

/// Classify a single path: probe → compare to cache → touch or upsert.
/// Run independently per path.
fn classify_one(path: &Path, cfg: &WorkerConfig) {
    let (size, mtime, ctime) = match metadata::probe(path) {
        Ok(triple) => triple,
        Err(e) => {
            warn!("skipping {}: {}", path.display(), e);
            cfg.counters.skipped_error.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            return;
        }
    };

    let cached = {
        let store = cfg.store.lock().unwrap();
        store.get_by_path(path)
    };
    let cached = match cached {
        Ok(c) => c,
        Err(e) => {
            warn!("index lookup failed for {}: {}", path.display(), e);
            cfg.counters.skipped_error.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            return;
        }
    };

    if cfg.incremental
        && let Some(existing) = &cached
        && existing.size == size
        && existing.mtime == mtime
        && existing.ctime == ctime
    {
        let store = cfg.store.lock().unwrap();
        if let Err(e) = store.touch_scan(path, cfg.scan_id) {
            warn!("failed to touch scan for {}: {}", path.display(), e);
            cfg.counters.skipped_error.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            return;
        }
        cfg.counters.skipped_unchanged.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        return;
    }

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    let hash = if cfg.components.contains(HashComponents::CONTENT) {
        // Content hashing is deferred to phase two; record metadata with a null hash.
        None
    } else {
        Some(composite_hash(cfg.components, size, ctime, mtime, filename, None))
    };

    let store = cfg.store.lock().unwrap();
    if let Err(e) = store.upsert(path, size, mtime, ctime, cfg.scan_id, hash) {
        warn!("failed to upsert {}: {}", path.display(), e);
        cfg.counters.skipped_error.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        return;
    }
    cfg.counters.updated.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
}

//! Phase-two content hashing: once the scan phase has written metadata-only
//! records, iterate duplicate-size buckets and compute the full composite
//! (including the content fingerprint) for each member.
//!
//! A `rayon` parallel iterator fanning out over bucket members, writing each
//! result straight through the Index Store.
//!
//! This phase tracks its own progress separately from [`super::context::ScanCounters`]:
//! `updated`/`skipped_unchanged` describe scan-phase classification outcomes
//! only, and a file already counted there is not re-counted just because its
//! content gets hashed here too.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::warn;
use rayon::prelude::*;

use crate::hashing::{composite_hash, sample_file};
use crate::store::SharedIndexStore;
use crate::types::{FileRecord, HashComponents};

use super::context::{CancelToken, is_cancelled};
use super::progress::create_hash_bar;

/// Run phase-two content hashing: for every file in every duplicate-size
/// bucket from the just-completed scan, sample its content and write back
/// the full composite hash. Errors on individual files are reported and do
/// not abort the phase. Returns the number of files hashed.
pub fn run_content_hash_phase(
    store: &SharedIndexStore,
    components: HashComponents,
    scan_id: i64,
    num_workers: usize,
    cancel: &CancelToken,
    show_progress: bool,
) -> anyhow::Result<usize> {
    let sizes = store.lock().unwrap().duplicate_sizes_for_current_run(scan_id)?;

    let total: usize = sizes
        .iter()
        .filter_map(|&size| store.lock().unwrap().files_of_size(size, scan_id).ok())
        .map(|members| members.len())
        .sum();
    let bar = show_progress.then(|| create_hash_bar(total as u64));
    let hashed = Arc::new(AtomicUsize::new(0));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers.max(1))
        .build()
        .map_err(|e| anyhow::anyhow!("build content-hash thread pool: {e}"))?;

    pool.install(|| {
        for size in &sizes {
            if is_cancelled(cancel) {
                break;
            }
            let members = match store.lock().unwrap().files_of_size(*size, scan_id) {
                Ok(m) => m,
                Err(e) => {
                    warn!("failed to list files of size {size}: {e}");
                    continue;
                }
            };
            members.par_iter().for_each(|member| {
                if is_cancelled(cancel) {
                    return;
                }
                hash_one_member(store, components, member);
                let done = hashed.fetch_add(1, Ordering::Relaxed) + 1;
                if let Some(bar) = &bar {
                    bar.set_position(done as u64);
                }
            });
        }
    });

    if let Some(bar) = &bar {
        bar.set_position(hashed.load(Ordering::Relaxed) as u64);
        bar.finish_and_clear();
    }

    Ok(hashed.load(Ordering::Relaxed))
}

fn hash_one_member(store: &SharedIndexStore, components: HashComponents, member: &FileRecord) {
    let content = sample_file(&member.path, member.size);
    let filename = member
        .path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let hash = composite_hash(
        components,
        member.size,
        member.ctime,
        member.mtime,
        filename,
        Some(content),
    );
    let store = store.lock().unwrap();
    if let Err(e) = store.update_hash(&member.path, hash) {
        warn!("failed to write content hash for {}: {}", member.path.display(), e);
    }
}

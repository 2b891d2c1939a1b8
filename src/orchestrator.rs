//! Orchestrator: sequences one full run through the state machine
//! `INIT -> SCAN -> [CONTENT-HASH?] -> DETECT -> INTERACT -> SWEEP -> DONE`.
//!
//! Top-level sequencing: set up tuning, run the pipeline, join handles, check
//! for errors. A changed `hash_components` mask (persisted config vs. the
//! current CLI flags) forces a full rescan but is never treated as fatal.

use anyhow::{Context, Result, bail};
use log::info;

use crate::config::SWEEP_KEEP_GENERATIONS;
use crate::detector;
use crate::pipeline::{self, install_ctrlc_handler};
use crate::store::{HASH_COMPONENTS_CONFIG_KEY, IndexStore};
use crate::types::ScanOptions;
use crate::ui::{self, InteractSummary};

/// Everything a completed run reports back to the caller.
#[derive(Debug)]
pub struct RunReport {
    pub scan: crate::types::ScanProgress,
    pub duplicate_groups: usize,
    pub interact: InteractSummary,
    pub rows_swept: usize,
}

/// Run one full INIT..DONE cycle against `opts`.
pub fn run(opts: &ScanOptions) -> Result<RunReport> {
    if !opts.root.exists() {
        bail!("root path does not exist: {}", opts.root.display());
    }
    if !opts.root.is_dir() {
        bail!("root path is not a directory: {}", opts.root.display());
    }

    let store = IndexStore::open(&opts.db_path)
        .with_context(|| format!("open index database at {}", opts.db_path.display()))?
        .into_shared();

    let persisted_mask = store.lock().unwrap().config_get(HASH_COMPONENTS_CONFIG_KEY)?;
    let mask_changed = persisted_mask
        .as_deref()
        .and_then(|s| s.parse::<u8>().ok())
        != Some(opts.components.bits());
    if mask_changed {
        info!("hash_components changed since last run; forcing full rescan");
    }
    let incremental = !opts.full_scan && !mask_changed;
    store
        .lock()
        .unwrap()
        .config_set(HASH_COMPONENTS_CONFIG_KEY, &opts.components.bits().to_string())?;

    let cancel = install_ctrlc_handler()?;
    let now = now_unix_secs();
    let scan_id = store.lock().unwrap().begin_scan(now)?;

    let counters = pipeline::run_scan_phase(
        &opts.root,
        Some(&opts.db_path),
        &store,
        opts.components,
        incremental,
        scan_id,
        opts.workers,
        opts.follow_links,
        &cancel,
        !opts.verbose,
    )?;

    if opts.components.contains(crate::types::HashComponents::CONTENT) {
        let hashed = pipeline::run_content_hash_phase(
            &store,
            opts.components,
            scan_id,
            opts.workers,
            &cancel,
            !opts.verbose,
        )?;
        info!("content-hashed {hashed} file(s) across duplicate-size buckets");
    }

    // Metadata-only hashes are always computed during the scan phase, so
    // detection always runs by-hash; by-size exists only for debugging and
    // future modes.
    let total_groups = detector::count_duplicate_hash_groups(&store, scan_id)?;
    info!("{total_groups} duplicate group(s) found");

    let groups = detector::by_hash(store.clone(), scan_id)?;
    let interact = ui::run_interactive(groups);

    let rows_swept = store.lock().unwrap().sweep(SWEEP_KEEP_GENERATIONS)?;
    info!("swept {rows_swept} row(s) from prior generations");

    Ok(RunReport {
        scan: counters.snapshot(),
        duplicate_groups: total_groups,
        interact,
        rows_swept,
    })
}

fn now_unix_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

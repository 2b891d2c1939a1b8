//! Application configuration constants: tuning and thresholds in one place.

/// Default index database filename, used when `--db` is not given.
pub const DEFAULT_DB_FILENAME: &str = ".dups.db";

/// Batch size for DB insert/update chunks (balance transaction size vs round-trips).
pub const DB_INSERT_BATCH_SIZE: usize = 1000;

/// Capacity of the bounded channel between the directory walker and metadata workers.
pub const WALK_CHANNEL_CAP: usize = 10_000;

/// Number of duplicate-size (or duplicate-hash) buckets prefetched at a time by the
/// Duplicate Detector's lazy iterator.
pub const DETECTOR_BATCH_PREFETCH: usize = 100;

/// Generations of scan history retained by the sweep step; rows from any older
/// `scan_id` are deleted.
pub const SWEEP_KEEP_GENERATIONS: i64 = 2;

/// Progress reporting tuning.
pub struct ProgressConsts;

impl ProgressConsts {
    /// Batch size for scan-phase progress updates ("every ~1,000 files").
    pub const PROGRESS_UPDATE_BATCH_SIZE: usize = 1_000;
}

/// Bounded retry for transient SQLITE_BUSY/SQLITE_LOCKED errors.
pub struct RetryConsts;

impl RetryConsts {
    pub const MAX_ATTEMPTS: u32 = 5;
    pub const BASE_BACKOFF_MS: u64 = 20;
}

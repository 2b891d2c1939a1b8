//! Metadata Probe: turns `std::fs::Metadata` into the `(size, mtime, ctime)`
//! triple the rest of the crate works with, in whole seconds since the epoch.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};

static WARNED_NO_BIRTHTIME: AtomicBool = AtomicBool::new(false);

/// Size, mtime, and ctime (birth time where the platform has one, else 0) for `path`.
pub fn probe(path: &Path) -> Result<(u64, i64, i64)> {
    let meta = std::fs::symlink_metadata(path)
        .with_context(|| format!("stat failed for {}", path.display()))?;

    let size = meta.len();
    let mtime = meta
        .modified()
        .ok()
        .and_then(|t| to_unix_seconds(t))
        .unwrap_or(0);
    let ctime = meta.created().ok().and_then(|t| to_unix_seconds(t)).unwrap_or_else(|| {
        warn_once_no_birthtime();
        0
    });

    Ok((size, mtime, ctime))
}

fn to_unix_seconds(t: SystemTime) -> Option<i64> {
    t.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs() as i64)
}

fn warn_once_no_birthtime() {
    if !WARNED_NO_BIRTHTIME.swap(true, Ordering::Relaxed) {
        log::warn!(
            "this platform/filesystem does not report file creation time; \
             ctime-based comparisons will treat all files as created at epoch 0"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn probes_a_real_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello").unwrap();
        f.flush().unwrap();
        let (size, mtime, _ctime) = probe(f.path()).unwrap();
        assert_eq!(size, 5);
        assert!(mtime > 0);
    }

    #[test]
    fn missing_path_errors() {
        assert!(probe(Path::new("/nonexistent/dupefinder/probe/target")).is_err());
    }
}

//! Enumerator: a breadth-first walk of the root that feeds file paths to the
//! bounded queue shared with the worker pool.
//!
//! One thread producing path-or-error outcomes, consumed by a common loop
//! that applies inclusion filtering and skip-on-error handling. Hand-rolled
//! as a `VecDeque`-based BFS over `std::fs::read_dir`: the "enqueue child
//! directories, then yield files" ordering this needs isn't what `walkdir`
//! or `jwalk` give you (both are depth-first).

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Sender;
use log::warn;

use super::context::{CancelToken, is_cancelled};

/// Spawn the enumerator thread. Sends every file path found beneath `root`
/// (except `exclude_path`, typically the index database itself, and its
/// `-wal`/`-shm` WAL sidecars) on `path_tx`, then drops it so the worker
/// pool's channel closes. Returns a handle that joins to the total number of
/// paths sent.
pub fn spawn_enumerator(
    root: PathBuf,
    exclude_path: Option<PathBuf>,
    path_tx: Sender<PathBuf>,
    follow_links: bool,
    cancel: CancelToken,
) -> JoinHandle<usize> {
    thread::spawn(move || run_enumerator(&root, exclude_path.as_deref(), path_tx, follow_links, &cancel))
}

fn run_enumerator(
    root: &Path,
    exclude_path: Option<&Path>,
    path_tx: Sender<PathBuf>,
    follow_links: bool,
    cancel: &CancelToken,
) -> usize {
    let wal_path = exclude_path.map(|p| sidecar_path(p, "-wal"));
    let shm_path = exclude_path.map(|p| sidecar_path(p, "-shm"));

    let mut sent = 0usize;
    let mut dirs: VecDeque<PathBuf> = VecDeque::new();
    dirs.push_back(root.to_path_buf());

    while let Some(dir) = dirs.pop_front() {
        if is_cancelled(cancel) {
            break;
        }

        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot read directory {}: {}", dir.display(), e);
                continue;
            }
        };

        // Collect children first so one bad entry doesn't abort the rest of
        // this directory's siblings (they were already enqueued).
        let mut child_dirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("error reading entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if exclude_path.is_some_and(|p| p == path)
                || wal_path.as_deref().is_some_and(|p| p == path)
                || shm_path.as_deref().is_some_and(|p| p == path)
            {
                continue;
            }

            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(e) => {
                    warn!("cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };

            if file_type.is_dir() || (follow_links && file_type.is_symlink() && path.is_dir()) {
                child_dirs.push(path);
            } else {
                if path_tx.send(path).is_err() {
                    return sent;
                }
                sent += 1;
            }
        }
        dirs.extend(child_dirs);
    }

    sent
}

/// Append `suffix` to `path`'s full name, e.g. `.dups.db` + `-wal` ->
/// `.dups.db-wal`, matching SQLite's own WAL sidecar naming.
fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn make_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("b.txt"), b"b").unwrap();
        std::fs::create_dir(dir.path().join("sub").join("sub2")).unwrap();
        std::fs::write(dir.path().join("sub").join("sub2").join("c.txt"), b"c").unwrap();
        dir
    }

    #[test]
    fn finds_all_files_recursively() {
        let dir = make_tree();
        let (tx, rx) = unbounded();
        let cancel: CancelToken = Arc::new(AtomicBool::new(false));
        let count = run_enumerator(dir.path(), None, tx, false, &cancel);
        let mut found: Vec<PathBuf> = rx.try_iter().collect();
        found.sort();
        assert_eq!(count, 3);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn excludes_the_given_path() {
        let dir = make_tree();
        let exclude = dir.path().join("a.txt");
        let (tx, rx) = unbounded();
        let cancel: CancelToken = Arc::new(AtomicBool::new(false));
        let count = run_enumerator(dir.path(), Some(&exclude), tx, false, &cancel);
        let found: Vec<PathBuf> = rx.try_iter().collect();
        assert_eq!(count, 2);
        assert!(!found.contains(&exclude));
    }

    #[test]
    fn excludes_wal_and_shm_sidecars_of_the_given_path() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(".dups.db");
        std::fs::write(&db, b"db").unwrap();
        std::fs::write(dir.path().join(".dups.db-wal"), b"wal").unwrap();
        std::fs::write(dir.path().join(".dups.db-shm"), b"shm").unwrap();
        std::fs::write(dir.path().join("real.txt"), b"real").unwrap();

        let (tx, rx) = unbounded();
        let cancel: CancelToken = Arc::new(AtomicBool::new(false));
        let count = run_enumerator(dir.path(), Some(&db), tx, false, &cancel);
        let found: Vec<PathBuf> = rx.try_iter().collect();
        assert_eq!(count, 1);
        assert_eq!(found, vec![dir.path().join("real.txt")]);
    }

    #[test]
    fn cancellation_stops_the_walk_early() {
        let dir = make_tree();
        let (tx, rx) = unbounded();
        let cancel: CancelToken = Arc::new(AtomicBool::new(true));
        let count = run_enumerator(dir.path(), None, tx, false, &cancel);
        assert_eq!(count, 0);
        assert_eq!(rx.try_iter().count(), 0);
    }
}

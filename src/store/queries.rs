//! Read/write operations against the `files` and `config` tables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, params};

use crate::error::DupefinderError;
use crate::types::FileRecord;

use super::IndexStore;
use super::schema::{UPSERT_FILE_NO_HASH_SQL, UPSERT_FILE_WITH_HASH_SQL};

/// Well-known `config` key holding the `hash_components` bitmask from the last successful run.
pub const HASH_COMPONENTS_CONFIG_KEY: &str = "hash_components";

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<FileRecord> {
    let path: String = row.get("path")?;
    let hash: Option<Vec<u8>> = row.get("hash")?;
    Ok(FileRecord {
        id: row.get("id")?,
        path: PathBuf::from(path),
        size: row.get::<_, i64>("size")? as u64,
        mtime: row.get("modified")?,
        ctime: row.get("created")?,
        hash: hash.and_then(|h| h.try_into().ok()),
        scan_id: row.get("scan_id")?,
    })
}

impl IndexStore {
    /// Look up the single row for `path`, if it's been seen before.
    pub fn get_by_path(&self, path: &Path) -> Result<Option<FileRecord>> {
        self.conn()
            .query_row(
                "SELECT id, path, size, modified, created, hash, scan_id FROM files WHERE path = ?1",
                params![path.to_string_lossy()],
                row_to_record,
            )
            .optional()
            .context("query file by path")
    }

    /// Insert a new row for `path`, or update the existing one.
    ///
    /// On collision, overwrites size/mtime/ctime/scan_id unconditionally. The
    /// hash column is set only when `hash` is `Some` — a metadata-only
    /// refresh (`hash: None`) preserves whatever hash the row already had,
    /// per the Index Store contract.
    pub fn upsert(
        &self,
        path: &Path,
        size: u64,
        mtime: i64,
        ctime: i64,
        scan_id: i64,
        hash: Option<[u8; 8]>,
    ) -> Result<()> {
        self.with_retry(|conn| {
            match hash {
                None => conn.execute(
                    UPSERT_FILE_NO_HASH_SQL,
                    params![path.to_string_lossy(), size as i64, mtime, ctime, scan_id],
                ),
                Some(h) => conn.execute(
                    UPSERT_FILE_WITH_HASH_SQL,
                    params![
                        path.to_string_lossy(),
                        size as i64,
                        mtime,
                        ctime,
                        h.as_slice(),
                        scan_id,
                    ],
                ),
            }
            .map_err(DupefinderError::from)?;
            Ok(())
        })
    }

    /// Stamp an unchanged file's `scan_id` forward without touching any other field.
    pub fn touch_scan(&self, path: &Path, scan_id: i64) -> Result<()> {
        self.with_retry(|conn| {
            conn.execute(
                "UPDATE files SET scan_id = ?1 WHERE path = ?2",
                params![scan_id, path.to_string_lossy()],
            )
            .map_err(DupefinderError::from)?;
            Ok(())
        })
    }

    /// Set a row's hash unconditionally (used by phase-two content hashing).
    pub fn update_hash(&self, path: &Path, hash: [u8; 8]) -> Result<()> {
        self.with_retry(|conn| {
            conn.execute(
                "UPDATE files SET hash = ?1 WHERE path = ?2",
                params![hash.as_slice(), path.to_string_lossy()],
            )
            .map_err(DupefinderError::from)?;
            Ok(())
        })
    }

    /// Highest `scan_id` recorded so far, or 0 if the store is empty.
    pub fn max_scan_id(&self) -> Result<i64> {
        self.conn()
            .query_row("SELECT COALESCE(MAX(scan_id), 0) FROM files", [], |row| {
                row.get(0)
            })
            .context("query max scan_id")
    }

    /// Allocate this run's scan generation from the current wall-clock
    /// second, but never going backwards relative to what's already stored
    /// (two runs landing in the same second legitimately share an id; this
    /// just guards against clock skew going the other way).
    pub fn begin_scan(&self, now_unix_secs: i64) -> Result<i64> {
        let prior = self.max_scan_id()?;
        Ok(now_unix_secs.max(prior + 1).max(1))
    }

    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.conn()
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("query config")
    }

    pub fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.with_retry(|conn| {
            conn.execute(
                "INSERT INTO config (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map_err(DupefinderError::from)?;
            Ok(())
        })
    }

    /// Sizes that appear more than once among files stamped with `scan_id`, largest first.
    pub fn duplicate_sizes_for_current_run(&self, scan_id: i64) -> Result<Vec<u64>> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT size FROM files WHERE scan_id = ?1
                 GROUP BY size HAVING COUNT(*) > 1 ORDER BY size DESC",
            )
            .context("prepare duplicate_sizes_for_current_run")?;
        let sizes = stmt
            .query_map(params![scan_id], |row| row.get::<_, i64>(0))
            .context("query duplicate_sizes_for_current_run")?
            .map(|r| r.map(|v| v as u64))
            .collect::<rusqlite::Result<Vec<u64>>>()
            .context("read duplicate_sizes_for_current_run rows")?;
        Ok(sizes)
    }

    /// Count-only variant of [`IndexStore::duplicate_sizes_for_current_run`];
    /// never materializes bucket membership.
    pub fn count_duplicate_sizes(&self, scan_id: i64) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM (
                     SELECT size FROM files WHERE scan_id = ?1
                     GROUP BY size HAVING COUNT(*) > 1
                 )",
                params![scan_id],
                |row| row.get(0),
            )
            .context("count duplicate sizes")?;
        Ok(count as usize)
    }

    /// All files of exactly `size` stamped with `scan_id`, path ascending.
    pub fn files_of_size(&self, size: u64, scan_id: i64) -> Result<Vec<FileRecord>> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT id, path, size, modified, created, hash, scan_id
                 FROM files WHERE size = ?1 AND scan_id = ?2 ORDER BY path ASC",
            )
            .context("prepare files_of_size")?;
        let rows = stmt
            .query_map(params![size as i64, scan_id], row_to_record)
            .context("query files_of_size")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read files_of_size rows")?;
        Ok(rows)
    }

    /// Non-null hashes that appear more than once among files stamped with
    /// `scan_id`, ordered by the maximum size within each bucket, descending.
    pub fn duplicate_hashes_for_current_run(&self, scan_id: i64) -> Result<Vec<[u8; 8]>> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT hash FROM files WHERE scan_id = ?1 AND hash IS NOT NULL
                 GROUP BY hash HAVING COUNT(*) > 1 ORDER BY MAX(size) DESC",
            )
            .context("prepare duplicate_hashes_for_current_run")?;
        let hashes = stmt
            .query_map(params![scan_id], |row| row.get::<_, Vec<u8>>(0))
            .context("query duplicate_hashes_for_current_run")?
            .map(|r| r.map(|v| v.try_into().unwrap_or([0u8; 8])))
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read duplicate_hashes_for_current_run rows")?;
        Ok(hashes)
    }

    /// Count-only variant of [`IndexStore::duplicate_hashes_for_current_run`].
    pub fn count_duplicate_hashes(&self, scan_id: i64) -> Result<usize> {
        let count: i64 = self
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM (
                     SELECT hash FROM files WHERE scan_id = ?1 AND hash IS NOT NULL
                     GROUP BY hash HAVING COUNT(*) > 1
                 )",
                params![scan_id],
                |row| row.get(0),
            )
            .context("count duplicate hashes")?;
        Ok(count as usize)
    }

    /// All files with exactly `hash` stamped with `scan_id`, path ascending.
    pub fn files_of_hash(&self, hash: &[u8; 8], scan_id: i64) -> Result<Vec<FileRecord>> {
        let mut stmt = self
            .conn()
            .prepare(
                "SELECT id, path, size, modified, created, hash, scan_id
                 FROM files WHERE hash = ?1 AND scan_id = ?2 ORDER BY path ASC",
            )
            .context("prepare files_of_hash")?;
        let rows = stmt
            .query_map(params![hash.as_slice(), scan_id], row_to_record)
            .context("query files_of_hash")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read files_of_hash rows")?;
        Ok(rows)
    }

    /// Delete every row whose `scan_id` is not among the `keep_generations`
    /// most recent distinct `scan_id` values present in the table. Returns
    /// the number of rows removed.
    pub fn sweep(&self, keep_generations: i64) -> Result<usize> {
        self.with_retry(|conn| {
            conn.execute(
                "DELETE FROM files WHERE scan_id NOT IN (
                     SELECT DISTINCT scan_id FROM files ORDER BY scan_id DESC LIMIT ?1
                 )",
                params![keep_generations],
            )
            .map_err(DupefinderError::from)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IndexStore;

    fn rec(store: &IndexStore, path: &str, size: u64, scan_id: i64) {
        store
            .upsert(Path::new(path), size, 0, 0, scan_id, None)
            .unwrap();
    }

    #[test]
    fn upsert_then_get_roundtrips() {
        let store = IndexStore::open_in_memory().unwrap();
        rec(&store, "/a", 100, 1);
        let got = store.get_by_path(Path::new("/a")).unwrap().unwrap();
        assert_eq!(got.size, 100);
        assert_eq!(got.scan_id, 1);
        assert_eq!(got.hash, None);
    }

    #[test]
    fn metadata_only_upsert_preserves_existing_hash() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert(Path::new("/a"), 100, 0, 0, 1, Some([1; 8]))
            .unwrap();
        // A later metadata-only refresh (no new hash) must not clear it.
        store.upsert(Path::new("/a"), 100, 5, 0, 2, None).unwrap();
        let got = store.get_by_path(Path::new("/a")).unwrap().unwrap();
        assert_eq!(got.hash, Some([1; 8]));
        assert_eq!(got.scan_id, 2);
        assert_eq!(got.mtime, 5);
    }

    #[test]
    fn upsert_with_hash_overwrites() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert(Path::new("/a"), 100, 0, 0, 1, Some([1; 8]))
            .unwrap();
        store
            .upsert(Path::new("/a"), 100, 0, 0, 2, Some([2; 8]))
            .unwrap();
        let got = store.get_by_path(Path::new("/a")).unwrap().unwrap();
        assert_eq!(got.hash, Some([2; 8]));
    }

    #[test]
    fn update_hash_sets_unconditionally() {
        let store = IndexStore::open_in_memory().unwrap();
        rec(&store, "/a", 100, 1);
        store.update_hash(Path::new("/a"), [9; 8]).unwrap();
        let got = store.get_by_path(Path::new("/a")).unwrap().unwrap();
        assert_eq!(got.hash, Some([9; 8]));
    }

    #[test]
    fn touch_scan_updates_only_scan_id() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert(Path::new("/a"), 100, 7, 8, 1, Some([3; 8]))
            .unwrap();
        store.touch_scan(Path::new("/a"), 2).unwrap();
        let got = store.get_by_path(Path::new("/a")).unwrap().unwrap();
        assert_eq!(got.scan_id, 2);
        assert_eq!(got.mtime, 7);
        assert_eq!(got.ctime, 8);
        assert_eq!(got.hash, Some([3; 8]));
    }

    #[test]
    fn duplicate_sizes_orders_descending_and_requires_two() {
        let store = IndexStore::open_in_memory().unwrap();
        rec(&store, "/a", 100, 1);
        rec(&store, "/b", 100, 1);
        rec(&store, "/c", 50, 1);
        rec(&store, "/d", 200, 1);
        rec(&store, "/e", 200, 1);
        let sizes = store.duplicate_sizes_for_current_run(1).unwrap();
        assert_eq!(sizes, vec![200, 100]);
        assert_eq!(store.count_duplicate_sizes(1).unwrap(), 2);
    }

    #[test]
    fn files_of_size_orders_by_path() {
        let store = IndexStore::open_in_memory().unwrap();
        rec(&store, "/z", 100, 1);
        rec(&store, "/a", 100, 1);
        let files = store.files_of_size(100, 1).unwrap();
        assert_eq!(files[0].path, Path::new("/a"));
        assert_eq!(files[1].path, Path::new("/z"));
    }

    #[test]
    fn duplicate_hashes_orders_by_max_size_descending() {
        let store = IndexStore::open_in_memory().unwrap();
        store
            .upsert(Path::new("/a1"), 10, 0, 0, 1, Some([1; 8]))
            .unwrap();
        store
            .upsert(Path::new("/a2"), 10, 0, 0, 1, Some([1; 8]))
            .unwrap();
        store
            .upsert(Path::new("/b1"), 999, 0, 0, 1, Some([2; 8]))
            .unwrap();
        store
            .upsert(Path::new("/b2"), 999, 0, 0, 1, Some([2; 8]))
            .unwrap();
        let hashes = store.duplicate_hashes_for_current_run(1).unwrap();
        assert_eq!(hashes, vec![[2; 8], [1; 8]]);
        assert_eq!(store.count_duplicate_hashes(1).unwrap(), 2);
    }

    #[test]
    fn sweep_keeps_only_newest_generations() {
        let store = IndexStore::open_in_memory().unwrap();
        rec(&store, "/gen1", 1, 1);
        rec(&store, "/gen2", 1, 2);
        rec(&store, "/gen3", 1, 3);
        let removed = store.sweep(2).unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_by_path(Path::new("/gen1")).unwrap().is_none());
        assert!(store.get_by_path(Path::new("/gen2")).unwrap().is_some());
        assert!(store.get_by_path(Path::new("/gen3")).unwrap().is_some());
    }

    #[test]
    fn config_roundtrips_and_overwrites() {
        let store = IndexStore::open_in_memory().unwrap();
        assert_eq!(store.config_get(HASH_COMPONENTS_CONFIG_KEY).unwrap(), None);
        store.config_set(HASH_COMPONENTS_CONFIG_KEY, "2").unwrap();
        assert_eq!(
            store.config_get(HASH_COMPONENTS_CONFIG_KEY).unwrap(),
            Some("2".to_string())
        );
        store.config_set(HASH_COMPONENTS_CONFIG_KEY, "3").unwrap();
        assert_eq!(
            store.config_get(HASH_COMPONENTS_CONFIG_KEY).unwrap(),
            Some("3".to_string())
        );
    }
}

//! Schema and WAL tuning pragmas for the index database.

/// WAL tuning pragmas (synchronous, autocheckpoint, size limit). Applied after
/// `PRAGMA journal_mode = WAL`.
pub(crate) const WAL_PRAGMAS: &str = r#"
        PRAGMA synchronous = NORMAL;
        PRAGMA wal_autocheckpoint = 10000;
        PRAGMA journal_size_limit = 67108864;
        "#;

/// `files` holds one row per distinct path ever seen; `config` holds the
/// persisted key/value settings (notably `hash_components`) a scan was run with.
pub(crate) const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY,
    path TEXT UNIQUE NOT NULL,
    size INTEGER NOT NULL,
    modified INTEGER NOT NULL,
    created INTEGER NOT NULL DEFAULT 0,
    hash BLOB,
    scan_id INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_files_size ON files(size);
CREATE INDEX IF NOT EXISTS idx_files_hash ON files(hash) WHERE hash IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_files_scan_id ON files(scan_id);

CREATE TABLE IF NOT EXISTS config (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Upsert used when no new hash is being supplied: overwrites metadata and
/// `scan_id`, but preserves whatever hash (if any) the row already had.
pub(crate) const UPSERT_FILE_NO_HASH_SQL: &str = "
    INSERT INTO files (path, size, modified, created, hash, scan_id)
    VALUES (?1, ?2, ?3, ?4, NULL, ?5)
    ON CONFLICT(path) DO UPDATE SET
        size = excluded.size,
        modified = excluded.modified,
        created = excluded.created,
        scan_id = excluded.scan_id
";

/// Upsert used when a non-null hash is supplied: overwrites metadata, hash, and `scan_id`.
pub(crate) const UPSERT_FILE_WITH_HASH_SQL: &str = "
    INSERT INTO files (path, size, modified, created, hash, scan_id)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    ON CONFLICT(path) DO UPDATE SET
        size = excluded.size,
        modified = excluded.modified,
        created = excluded.created,
        hash = excluded.hash,
        scan_id = excluded.scan_id
";

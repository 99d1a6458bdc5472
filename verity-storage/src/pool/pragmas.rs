//! PRAGMA configuration applied to every SQLite connection.
//!
//! WAL mode, NORMAL sync, a bounded mmap/cache footprint, a shared
//! `busy_timeout`, and foreign keys on. Read connections skip the pragmas
//! that only matter for the writer (journal mode, synchronous level).

use rusqlite::Connection;

use verity_core::errors::VerityResult;

use crate::to_storage_err;

/// Apply the writer's full pragma set to a connection.
pub fn apply_write_pragmas(conn: &Connection, busy_timeout_ms: u32) -> VerityResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA mmap_size = 268435456;
        PRAGMA cache_size = -64000;
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        PRAGMA auto_vacuum = INCREMENTAL;
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Apply the lighter pragma set appropriate for a read-only pool connection.
pub fn apply_read_pragmas(conn: &Connection, busy_timeout_ms: u32) -> VerityResult<()> {
    conn.execute_batch(&format!(
        "
        PRAGMA busy_timeout = {busy_timeout_ms};
        PRAGMA foreign_keys = ON;
        "
    ))
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Verify that WAL mode is active on a connection.
pub fn verify_wal_mode(conn: &Connection) -> VerityResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

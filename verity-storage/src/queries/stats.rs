//! Key-value `system_stats` (e.g. `max_times_tested`, per-source learned confidence).

use rusqlite::{params, Connection, OptionalExtension};

use verity_core::errors::VerityResult;

use crate::to_storage_err;

pub fn get_stat(conn: &Connection, key: &str) -> VerityResult<Option<f64>> {
    conn.query_row("SELECT value FROM system_stats WHERE key = ?1", params![key], |row| row.get(0))
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))
}

pub fn set_stat(conn: &Connection, key: &str, value: f64) -> VerityResult<()> {
    conn.execute(
        "INSERT INTO system_stats (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

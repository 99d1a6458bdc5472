//! Housekeeping: vacuum.

use rusqlite::Connection;

use verity_core::errors::VerityResult;

use crate::to_storage_err;

pub fn full_vacuum(conn: &Connection) -> VerityResult<()> {
    conn.execute_batch("PRAGMA incremental_vacuum; VACUUM;")
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

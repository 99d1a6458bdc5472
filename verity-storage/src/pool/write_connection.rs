//! The single writer connection, serialized behind a mutex.
//!
//! SQLite allows only one writer at a time; rather than contend on file
//! locks, every mutating query funnels through this one connection.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use verity_core::errors::VerityResult;

use super::pragmas::apply_write_pragmas;
use crate::to_storage_err;

pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path, busy_timeout_ms: u32) -> VerityResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_storage_err(e.to_string()))?;
        apply_write_pragmas(&conn, busy_timeout_ms)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> VerityResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        apply_write_pragmas(&conn, 5_000)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Execute a closure with exclusive access to the writer connection.
    pub fn with_conn<F, T>(&self, f: F) -> VerityResult<T>
    where
        F: FnOnce(&Connection) -> VerityResult<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|e| to_storage_err(format!("writer lock poisoned: {e}")))?;
        f(&guard)
    }
}

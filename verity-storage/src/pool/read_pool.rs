//! A small pool of read-only connections, handed out round-robin.
//!
//! WAL mode lets readers proceed concurrently with the single writer, so
//! this pool exists purely to avoid re-opening a connection per query.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use verity_core::errors::VerityResult;

use super::pragmas::apply_read_pragmas;
use crate::to_storage_err;

const MAX_POOL_SIZE: usize = 16;

pub struct ReadPool {
    connections: Vec<Mutex<Connection>>,
    next: AtomicUsize,
}

impl ReadPool {
    pub fn open(path: &Path, pool_size: usize, busy_timeout_ms: u32) -> VerityResult<Self> {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
            apply_read_pragmas(&conn, busy_timeout_ms)?;
            connections.push(Mutex::new(conn));
        }
        Ok(Self { connections, next: AtomicUsize::new(0) })
    }

    /// In-memory read pool connections are isolated databases that cannot see
    /// the writer's changes; callers in that mode should route reads through
    /// the writer instead of opening this pool.
    pub fn open_in_memory(pool_size: usize, busy_timeout_ms: u32) -> VerityResult<Self> {
        let size = pool_size.clamp(1, MAX_POOL_SIZE);
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
            apply_read_pragmas(&conn, busy_timeout_ms)?;
            connections.push(Mutex::new(conn));
        }
        Ok(Self { connections, next: AtomicUsize::new(0) })
    }

    pub fn with_conn<F, T>(&self, f: F) -> VerityResult<T>
    where
        F: FnOnce(&Connection) -> VerityResult<T>,
    {
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.connections.len();
        let guard = self.connections[idx]
            .lock()
            .map_err(|e| to_storage_err(format!("read pool lock poisoned: {e}")))?;
        f(&guard)
    }

    pub fn size(&self) -> usize {
        self.connections.len()
    }
}

//! Connection pool managing the single writer and a bounded read pool.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use verity_core::errors::VerityResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

pub struct ConnectionPool {
    pub writer: WriteConnection,
    pub readers: ReadPool,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    pub fn open(path: &Path, read_pool_size: usize, busy_timeout_ms: u32) -> VerityResult<Self> {
        let writer = WriteConnection::open(path, busy_timeout_ms)?;
        let readers = ReadPool::open(path, read_pool_size, busy_timeout_ms)?;
        Ok(Self { writer, readers, db_path: Some(path.to_path_buf()) })
    }

    /// In-memory mode routes reads through the writer (see `ReadPool::open_in_memory`
    /// caveat), so the reader pool here is a vestigial single connection that the
    /// engine never actually queries.
    pub fn open_in_memory() -> VerityResult<Self> {
        let writer = WriteConnection::open_in_memory()?;
        let readers = ReadPool::open_in_memory(1, 5_000)?;
        Ok(Self { writer, readers, db_path: None })
    }
}

use serde::{Deserialize, Serialize};

/// Entity store (C1) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file. `None` opens an in-memory store.
    pub db_path: Option<String>,
    /// Size of the read-connection pool (file-backed mode only).
    pub read_pool_size: usize,
    /// `busy_timeout` applied to every connection, in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            read_pool_size: 4,
            busy_timeout_ms: 5_000,
        }
    }
}

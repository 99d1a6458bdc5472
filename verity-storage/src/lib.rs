//! # verity-storage
//!
//! SQLite-backed implementation of `verity_core::traits::EntityStore`: the
//! durable home for memories, their edges, and the append-only bookkeeping
//! tables (versions, access log, events, notifications, system stats).

pub mod audit;
pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use verity_core::errors::VerityError;

/// Mirrors `cortex-storage`'s `to_storage_err`: centralizes the conversion
/// from `rusqlite`/`serde_json` errors into the shared error taxonomy.
pub(crate) fn to_storage_err(message: impl Into<String>) -> VerityError {
    VerityError::Storage(message.into())
}

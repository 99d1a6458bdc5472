//! `StorageEngine` — owns the `ConnectionPool`, runs migrations on open,
//! implements `verity_core::traits::EntityStore`.

use std::path::Path;

use chrono::{DateTime, Utc};

use verity_core::errors::VerityResult;
use verity_core::memory::{Edge, EdgeType, EdgeTypeFilter, Memory};
use verity_core::models::{AccessEvent, ChangeType, MemoryEvent, Notification, VersionSnapshot};
use verity_core::traits::EntityStore;

use crate::audit::AuditLogger;
use crate::migrations;
use crate::pool::ConnectionPool;
use crate::queries;

pub struct StorageEngine {
    pool: ConnectionPool,
    use_read_pool: bool,
}

impl StorageEngine {
    pub fn open(path: &Path, read_pool_size: usize, busy_timeout_ms: u32) -> VerityResult<Self> {
        let pool = ConnectionPool::open(path, read_pool_size, busy_timeout_ms)?;
        let engine = Self { pool, use_read_pool: true };
        engine.initialize()?;
        Ok(engine)
    }

    /// In-memory mode routes every read through the writer: an in-memory read
    /// pool connection is an isolated database and would never see writes.
    pub fn open_in_memory() -> VerityResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        let engine = Self { pool, use_read_pool: false };
        engine.initialize()?;
        Ok(engine)
    }

    fn initialize(&self) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| migrations::run_migrations(conn))
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    fn with_reader<F, T>(&self, f: F) -> VerityResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> VerityResult<T>,
    {
        if self.use_read_pool {
            self.pool.readers.with_conn(f)
        } else {
            self.pool.writer.with_conn(f)
        }
    }
}

impl EntityStore for StorageEngine {
    fn insert_memory(&self, memory: &Memory) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| {
            queries::memory_crud::insert_memory(conn, memory)?;
            AuditLogger::log(conn, memory.agent_id.as_deref().unwrap_or("system"), "create", &memory.id)?;
            Ok(())
        })
    }

    fn get_memory(&self, id: &str) -> VerityResult<Option<Memory>> {
        self.with_reader(|conn| queries::memory_crud::get_memory(conn, id))
    }

    fn update_memory(&self, memory: &Memory) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| {
            if let Some(existing) = queries::memory_crud::get_memory(conn, &memory.id)? {
                let version_number = queries::versions::next_version_number(conn, &memory.id)?;
                let snapshot = VersionSnapshot {
                    entity_id: existing.id.clone(),
                    version_number,
                    change_type: ChangeType::Updated,
                    content_snapshot: serde_json::to_value(&existing).map_err(|e| {
                        verity_core::errors::VerityError::Serialization(e)
                    })?,
                    change_reason: None,
                    session_id: None,
                    request_id: None,
                    created_at: Utc::now(),
                };
                queries::versions::insert_version(conn, &snapshot)?;
            }
            queries::memory_crud::update_memory(conn, memory)?;
            AuditLogger::log(conn, memory.agent_id.as_deref().unwrap_or("system"), "update", &memory.id)?;
            Ok(())
        })
    }

    fn delete_memory(&self, id: &str) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| {
            queries::memory_crud::delete_memory(conn, id)?;
            AuditLogger::log(conn, "system", "delete", id)?;
            Ok(())
        })
    }

    fn find_by_content_hash(&self, hash: &str) -> VerityResult<Vec<Memory>> {
        self.with_reader(|conn| queries::memory_crud::find_by_content_hash(conn, hash))
    }

    fn find_pending_exposure(&self, older_than: DateTime<Utc>, limit: usize) -> VerityResult<Vec<Memory>> {
        self.with_reader(|conn| queries::memory_crud::find_pending_exposure(conn, older_than, limit))
    }

    fn find_due_for_resolution(&self, as_of: DateTime<Utc>) -> VerityResult<Vec<Memory>> {
        self.with_reader(|conn| queries::memory_crud::find_due_for_resolution(conn, as_of))
    }

    fn scan_memories(&self, limit: usize) -> VerityResult<Vec<Memory>> {
        self.with_reader(|conn| queries::memory_crud::scan_memories(conn, limit))
    }

    fn insert_edge(&self, edge: &Edge) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| queries::edges::insert_edge(conn, edge))
    }

    fn delete_edge(&self, source_id: &str, target_id: &str, edge_type: EdgeType) -> VerityResult<()> {
        self.pool
            .writer
            .with_conn(|conn| queries::edges::delete_edge(conn, source_id, target_id, edge_type))
    }

    fn outgoing_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
        self.with_reader(|conn| queries::edges::outgoing_edges(conn, memory_id, filter))
    }

    fn incoming_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
        self.with_reader(|conn| queries::edges::incoming_edges(conn, memory_id, filter))
    }

    fn all_signed_edges(&self) -> VerityResult<Vec<Edge>> {
        self.with_reader(queries::edges::all_signed_edges)
    }

    fn insert_version(&self, snapshot: &VersionSnapshot) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| queries::versions::insert_version(conn, snapshot))
    }

    fn history(&self, entity_id: &str) -> VerityResult<Vec<VersionSnapshot>> {
        self.with_reader(|conn| queries::versions::history(conn, entity_id))
    }

    fn record_access(&self, event: &AccessEvent) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| queries::access::record_access(conn, event))
    }

    fn access_log(&self, entity_id: &str, limit: usize) -> VerityResult<Vec<AccessEvent>> {
        self.with_reader(|conn| queries::access::access_log(conn, entity_id, limit))
    }

    fn enqueue_event(&self, event: &MemoryEvent) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| queries::events::enqueue_event(conn, event))
    }

    fn find_inactive_sessions(&self, older_than: DateTime<Utc>) -> VerityResult<Vec<String>> {
        self.with_reader(|conn| queries::events::find_inactive_sessions(conn, older_than))
    }

    fn claim_events(&self, session_id: &str, limit: usize) -> VerityResult<Vec<MemoryEvent>> {
        self.pool.writer.with_conn(|conn| queries::events::claim_events(conn, session_id, limit))
    }

    fn mark_event_dispatched(&self, event_id: &str, workflow_id: Option<&str>) -> VerityResult<()> {
        self.pool
            .writer
            .with_conn(|conn| queries::events::mark_event_dispatched(conn, event_id, workflow_id))
    }

    fn release_stuck_events(&self, grace: chrono::Duration) -> VerityResult<usize> {
        self.pool.writer.with_conn(|conn| queries::events::release_stuck_events(conn, grace))
    }

    fn insert_notification(&self, notification: &Notification) -> VerityResult<()> {
        self.pool
            .writer
            .with_conn(|conn| queries::notifications::insert_notification(conn, notification))
    }

    fn get_stat(&self, key: &str) -> VerityResult<Option<f64>> {
        self.with_reader(|conn| queries::stats::get_stat(conn, key))
    }

    fn set_stat(&self, key: &str, value: f64) -> VerityResult<()> {
        self.pool.writer.with_conn(|conn| queries::stats::set_stat(conn, key, value))
    }

    fn vacuum(&self) -> VerityResult<()> {
        self.pool.writer.with_conn(queries::maintenance::full_vacuum)
    }
}

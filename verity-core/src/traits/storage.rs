use chrono::{DateTime, Utc};

use crate::errors::VerityResult;
use crate::memory::{Edge, EdgeType, EdgeTypeFilter, Memory};
use crate::models::{AccessEvent, MemoryEvent, Notification, VersionSnapshot};

/// The belief graph's durable store: memories, their edges, and the
/// append-only bookkeeping tables (versions, access log, events,
/// notifications, system stats). Implemented by `verity-storage`'s
/// `StorageEngine`; every other crate programs against this trait rather
/// than against SQLite directly.
pub trait EntityStore: Send + Sync {
    // --- Memory CRUD ---
    fn insert_memory(&self, memory: &Memory) -> VerityResult<()>;
    fn get_memory(&self, id: &str) -> VerityResult<Option<Memory>>;
    fn update_memory(&self, memory: &Memory) -> VerityResult<()>;
    fn delete_memory(&self, id: &str) -> VerityResult<()>;

    /// Memories whose content hash matches, used for dedup/thesis-change checks.
    fn find_by_content_hash(&self, hash: &str) -> VerityResult<Vec<Memory>>;

    /// Rows still awaiting steps 5-7 of the write pipeline, for the pending sweeper.
    fn find_pending_exposure(&self, older_than: DateTime<Utc>, limit: usize) -> VerityResult<Vec<Memory>>;

    /// Memories with a `resolves_by` at or before `as_of` that haven't resolved yet.
    fn find_due_for_resolution(&self, as_of: DateTime<Utc>) -> VerityResult<Vec<Memory>>;

    /// Unfiltered, newest-first scan of up to `limit` memories — backs
    /// query-path operations (brittle, collisions) that weigh every memory
    /// rather than a named id or edge frontier.
    fn scan_memories(&self, limit: usize) -> VerityResult<Vec<Memory>>;

    // --- Edges ---
    fn insert_edge(&self, edge: &Edge) -> VerityResult<()>;
    fn delete_edge(&self, source_id: &str, target_id: &str, edge_type: EdgeType) -> VerityResult<()>;

    /// Edges leaving `memory_id`, optionally filtered to one edge type.
    fn outgoing_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>>;

    /// Edges arriving at `memory_id`, optionally filtered to one edge type.
    fn incoming_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>>;

    /// The full signed-edge subgraph (`derived_from`/`confirmed_by`/`violated_by`)
    /// for a full-graph propagation or zone-building pass.
    fn all_signed_edges(&self) -> VerityResult<Vec<Edge>>;

    // --- Versions / access log / events / notifications ---
    fn insert_version(&self, snapshot: &VersionSnapshot) -> VerityResult<()>;
    fn history(&self, entity_id: &str) -> VerityResult<Vec<VersionSnapshot>>;

    fn record_access(&self, event: &AccessEvent) -> VerityResult<()>;
    fn access_log(&self, entity_id: &str, limit: usize) -> VerityResult<Vec<AccessEvent>>;

    fn enqueue_event(&self, event: &MemoryEvent) -> VerityResult<()>;
    /// Sessions with at least one undispatched, unclaimed event whose most
    /// recent event predates `older_than` — ready for the sweeper to claim.
    fn find_inactive_sessions(&self, older_than: DateTime<Utc>) -> VerityResult<Vec<String>>;
    /// Claim up to `limit` undispatched events for `session_id`'s sweep, atomically
    /// marking them claimed so a concurrent sweeper can't double-dispatch them.
    fn claim_events(&self, session_id: &str, limit: usize) -> VerityResult<Vec<MemoryEvent>>;
    fn mark_event_dispatched(&self, event_id: &str, workflow_id: Option<&str>) -> VerityResult<()>;
    /// Release events claimed longer than `grace` ago but never marked dispatched.
    fn release_stuck_events(&self, grace: chrono::Duration) -> VerityResult<usize>;

    fn insert_notification(&self, notification: &Notification) -> VerityResult<()>;

    // --- System stats ---
    fn get_stat(&self, key: &str) -> VerityResult<Option<f64>>;
    fn set_stat(&self, key: &str, value: f64) -> VerityResult<()>;

    // --- Maintenance ---
    fn vacuum(&self) -> VerityResult<()>;
}

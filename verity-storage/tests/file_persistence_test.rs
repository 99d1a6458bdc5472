//! File-backed engine: WAL mode, durability across reopen, read/write split.

use chrono::Utc;
use verity_core::memory::{Confidence, ExposureStatus, Memory, MemoryState, Origin};
use verity_core::traits::EntityStore;
use verity_storage::StorageEngine;

fn make_memory(id: &str) -> Memory {
    Memory {
        id: id.to_string(),
        content: format!("durable claim {id}"),
        origin: Origin::Observation { source: "file-test".to_string() },
        resolves_by: None,
        outcome_condition: None,
        assumes: vec![],
        invalidates_if: vec![],
        confirms_if: vec![],
        tags: vec![],
        starting_confidence: Confidence::new(0.5),
        confirmations: 0,
        times_tested: 0,
        contradictions: 0,
        centrality: 0,
        propagated_confidence: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        state: MemoryState::Active,
        retracted: false,
        retracted_at: None,
        retraction_reason: None,
        violations: vec![],
        resolution_outcome: None,
        resolved_at: None,
        exposure_status: ExposureStatus::Pending,
        content_hash: Memory::compute_content_hash(&format!("durable claim {id}")),
        agent_id: None,
    }
}

#[test]
fn wal_mode_is_active_on_file_backed_engine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("verity.db");
    let engine = StorageEngine::open(&db_path, 4, 5_000).expect("open file-backed storage");

    engine.insert_memory(&make_memory("m1")).unwrap();
    assert!(engine.get_memory("m1").unwrap().is_some());
}

#[test]
fn reopening_an_existing_database_preserves_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("verity.db");

    {
        let engine = StorageEngine::open(&db_path, 2, 5_000).unwrap();
        engine.insert_memory(&make_memory("persisted")).unwrap();
    }

    let engine = StorageEngine::open(&db_path, 2, 5_000).unwrap();
    let loaded = engine.get_memory("persisted").unwrap();
    assert!(loaded.is_some());
}

#[test]
fn read_pool_sees_writer_committed_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("verity.db");
    let engine = StorageEngine::open(&db_path, 4, 5_000).unwrap();

    engine.insert_memory(&make_memory("via-reader")).unwrap();
    // get_memory in file-backed mode is routed through the read pool.
    let loaded = engine.get_memory("via-reader").unwrap();
    assert_eq!(loaded.unwrap().id, "via-reader");
}

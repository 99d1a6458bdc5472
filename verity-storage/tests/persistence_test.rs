//! Persistence reliability: CRUD round-trips, edge queries, WAL verification.

use chrono::Utc;
use verity_core::memory::{Confidence, Edge, EdgeType, EdgeTypeFilter, ExposureStatus, Memory, MemoryState, Origin};
use verity_core::traits::EntityStore;
use verity_storage::StorageEngine;

fn make_memory(id: &str) -> Memory {
    Memory {
        id: id.to_string(),
        content: format!("claim body for {id}"),
        origin: Origin::Observation { source: "unit-test".to_string() },
        resolves_by: None,
        outcome_condition: None,
        assumes: vec![],
        invalidates_if: vec!["counterexample surfaces".to_string()],
        confirms_if: vec!["replicated independently".to_string()],
        tags: vec!["test".to_string()],
        starting_confidence: Confidence::new(0.6),
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
        content_hash: Memory::compute_content_hash(&format!("claim body for {id}")),
        agent_id: Some("agent-1".to_string()),
    }
}

#[test]
fn insert_and_get_round_trips() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("m1");

    engine.insert_memory(&mem).unwrap();
    let loaded = engine.get_memory("m1").unwrap().expect("should exist");

    assert_eq!(loaded.id, "m1");
    assert_eq!(loaded.invalidates_if, mem.invalidates_if);
    assert_eq!(loaded.confirms_if, mem.confirms_if);
    assert_eq!(loaded.agent_id.as_deref(), Some("agent-1"));
}

#[test]
fn insert_duplicate_id_fails() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("dup");

    engine.insert_memory(&mem).unwrap();
    let result = engine.insert_memory(&mem);
    assert!(result.is_err());
}

#[test]
fn update_missing_memory_returns_not_found() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("ghost");
    let result = engine.update_memory(&mem);
    assert!(result.is_err());
}

#[test]
fn update_snapshots_prior_version() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mut mem = make_memory("m2");
    engine.insert_memory(&mem).unwrap();

    mem.content = "revised claim body".to_string();
    mem.updated_at = Utc::now();
    engine.update_memory(&mem).unwrap();

    let history = engine.history("m2").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].version_number, 1);
}

#[test]
fn delete_removes_memory() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("m3");
    engine.insert_memory(&mem).unwrap();
    engine.delete_memory("m3").unwrap();
    assert!(engine.get_memory("m3").unwrap().is_none());
}

#[test]
fn edge_filter_scopes_outgoing_edges() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine.insert_memory(&make_memory("a")).unwrap();
    engine.insert_memory(&make_memory("b")).unwrap();
    engine.insert_memory(&make_memory("c")).unwrap();

    engine.insert_edge(&Edge::new("a", "b", EdgeType::DerivedFrom)).unwrap();
    engine.insert_edge(&Edge::new("a", "c", EdgeType::ViolatedBy)).unwrap();

    let all = engine.outgoing_edges("a", EdgeTypeFilter::default()).unwrap();
    assert_eq!(all.len(), 2);

    let violations = engine.outgoing_edges("a", EdgeTypeFilter(Some(EdgeType::ViolatedBy))).unwrap();
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].target_id, "c");
}

#[test]
fn all_signed_edges_excludes_supersedes() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine.insert_memory(&make_memory("a")).unwrap();
    engine.insert_memory(&make_memory("b")).unwrap();

    engine.insert_edge(&Edge::new("a", "b", EdgeType::DerivedFrom)).unwrap();
    engine.insert_edge(&Edge::new("a", "b", EdgeType::Supersedes)).unwrap();

    let signed = engine.all_signed_edges().unwrap();
    assert_eq!(signed.len(), 1);
    assert_eq!(signed[0].edge_type, EdgeType::DerivedFrom);
}

#[test]
fn find_by_content_hash_matches_identical_content() {
    let engine = StorageEngine::open_in_memory().unwrap();
    let mem = make_memory("m4");
    engine.insert_memory(&mem).unwrap();

    let matches = engine.find_by_content_hash(&mem.content_hash).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, "m4");
}

#[test]
fn system_stats_round_trip() {
    let engine = StorageEngine::open_in_memory().unwrap();
    assert_eq!(engine.get_stat("max_times_tested").unwrap(), None);
    engine.set_stat("max_times_tested", 12.0).unwrap();
    assert_eq!(engine.get_stat("max_times_tested").unwrap(), Some(12.0));
    engine.set_stat("max_times_tested", 15.0).unwrap();
    assert_eq!(engine.get_stat("max_times_tested").unwrap(), Some(15.0));
}

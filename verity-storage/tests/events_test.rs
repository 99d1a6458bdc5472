//! Event queue: enqueue, claim-then-process dispatch, stuck-claim release.

use chrono::Utc;
use serde_json::json;
use verity_core::models::{EventType, MemoryEvent};
use verity_core::traits::EntityStore;
use verity_storage::StorageEngine;

fn make_event(id: &str, session_id: &str) -> MemoryEvent {
    MemoryEvent {
        id: id.to_string(),
        session_id: session_id.to_string(),
        event_type: EventType::Violation,
        memory_id: "m1".to_string(),
        violated_by: Some("m2".to_string()),
        damage_level: None,
        context: json!({}),
        created_at: Utc::now(),
        dispatched: false,
        dispatched_at: None,
        workflow_id: None,
    }
}

#[test]
fn claim_events_only_returns_unclaimed_rows_for_the_session() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine.enqueue_event(&make_event("e1", "sess-a")).unwrap();
    engine.enqueue_event(&make_event("e2", "sess-a")).unwrap();
    engine.enqueue_event(&make_event("e3", "sess-b")).unwrap();

    let claimed = engine.claim_events("sess-a", 10).unwrap();
    assert_eq!(claimed.len(), 2);

    let claimed_again = engine.claim_events("sess-a", 10).unwrap();
    assert!(claimed_again.is_empty(), "a second claim should see nothing new");
}

#[test]
fn claim_events_respects_limit() {
    let engine = StorageEngine::open_in_memory().unwrap();
    for i in 0..5 {
        engine.enqueue_event(&make_event(&format!("e{i}"), "sess-a")).unwrap();
    }

    let claimed = engine.claim_events("sess-a", 3).unwrap();
    assert_eq!(claimed.len(), 3);
}

#[test]
fn mark_event_dispatched_removes_it_from_future_claims() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine.enqueue_event(&make_event("e1", "sess-a")).unwrap();

    let claimed = engine.claim_events("sess-a", 10).unwrap();
    assert_eq!(claimed.len(), 1);
    engine.mark_event_dispatched(&claimed[0].id, Some("wf-1")).unwrap();

    engine.release_stuck_events(chrono::Duration::seconds(0)).unwrap();
    let claimed_again = engine.claim_events("sess-a", 10).unwrap();
    assert!(claimed_again.is_empty());
}

#[test]
fn release_stuck_events_only_frees_claims_past_the_grace_period() {
    let engine = StorageEngine::open_in_memory().unwrap();
    engine.enqueue_event(&make_event("e1", "sess-a")).unwrap();
    engine.claim_events("sess-a", 10).unwrap();

    let freed = engine.release_stuck_events(chrono::Duration::hours(1)).unwrap();
    assert_eq!(freed, 0, "claim is fresh, should not be released within the grace window");

    let freed = engine.release_stuck_events(chrono::Duration::seconds(-1)).unwrap();
    assert_eq!(freed, 1, "a negative grace window treats every existing claim as stale");

    let claimed_again = engine.claim_events("sess-a", 10).unwrap();
    assert_eq!(claimed_again.len(), 1, "released claim is claimable again");
}

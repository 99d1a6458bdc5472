use chrono::Utc;
use serde_json::json;
use verity_core::memory::DamageLevel;
use verity_core::models::{
    system_stats, AccessEvent, AccessType, ChangeType, EventType, MemoryEvent, Notification,
    NotificationType, VersionSnapshot,
};

fn roundtrip<T: serde::Serialize + serde::de::DeserializeOwned>(val: &T) -> T {
    let json = serde_json::to_string(val).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn version_snapshot_roundtrip() {
    let snap = VersionSnapshot {
        entity_id: "m1".into(),
        version_number: 2,
        change_type: ChangeType::Updated,
        content_snapshot: json!({"content": "revised claim"}),
        change_reason: Some("thesis unchanged, tightened wording".into()),
        session_id: Some("sess-1".into()),
        request_id: None,
        created_at: Utc::now(),
    };
    let r = roundtrip(&snap);
    assert_eq!(r.entity_id, "m1");
    assert_eq!(r.version_number, 2);
    assert_eq!(r.change_type, ChangeType::Updated);
}

#[test]
fn access_event_roundtrip() {
    let event = AccessEvent {
        entity_id: "m1".into(),
        access_type: AccessType::Recall,
        session_id: Some("sess-1".into()),
        query_text: Some("cache eviction latency".into()),
        result_rank: Some(1),
        similarity: Some(0.82),
        created_at: Utc::now(),
    };
    let r = roundtrip(&event);
    assert_eq!(r.access_type, AccessType::Recall);
    assert_eq!(r.result_rank, Some(1));
}

#[test]
fn memory_event_roundtrip_with_damage_level() {
    let event = MemoryEvent {
        id: "evt-1".into(),
        session_id: "sess-1".into(),
        event_type: EventType::CoreViolation,
        memory_id: "m1".into(),
        violated_by: Some("m2".into()),
        damage_level: Some(DamageLevel::Core),
        context: json!({"reason": "p99 regression"}),
        created_at: Utc::now(),
        dispatched: false,
        dispatched_at: None,
        workflow_id: None,
    };
    let r = roundtrip(&event);
    assert_eq!(r.event_type, EventType::CoreViolation);
    assert_eq!(r.damage_level, Some(DamageLevel::Core));
}

#[test]
fn notification_roundtrip() {
    let n = Notification {
        id: "notif-1".into(),
        notification_type: NotificationType::ZoneUnsafe,
        memory_id: "m1".into(),
        content: "zone quality dropped below survival ratio".into(),
        context: json!({}),
        read: false,
        created_at: Utc::now(),
    };
    let r = roundtrip(&n);
    assert_eq!(r.notification_type, NotificationType::ZoneUnsafe);
    assert!(!r.read);
}

#[test]
fn evidence_weight_grows_with_times_tested_but_stays_bounded() {
    let low = system_stats::evidence_weight(1, Some(10.0));
    let high = system_stats::evidence_weight(9, Some(10.0));
    assert!(low < high);
    assert!(high <= 1.0);
    assert_eq!(system_stats::evidence_weight(0, Some(10.0)), 0.0);
}

#[test]
fn evidence_weight_uses_fallback_max_when_absent() {
    let w = system_stats::evidence_weight(5, None);
    assert!(w > 0.0 && w <= 1.0);
}

#[test]
fn learned_confidence_key_is_namespaced_by_source() {
    assert_eq!(
        system_stats::learned_confidence_key("load-test-2026-01"),
        "source:load-test-2026-01:learned_confidence"
    );
}

/// Verify every trait is implementable by creating mock structs.
/// This catches missing method signatures and type mismatches at compile time.
use chrono::{DateTime, Duration, Utc};
use verity_core::errors::VerityResult;
use verity_core::memory::{Edge, EdgeType, EdgeTypeFilter, Memory};
use verity_core::models::{AccessEvent, MemoryEvent, Notification, VersionSnapshot};
use std::collections::HashMap;
use std::sync::Mutex;
use verity_core::traits::{
    Embedder, EntityStore, ExposureJob, ExposureQueue, IndexStore, ShockPropagator, ShockResult, ThesisArbiter,
    ThesisVerdict,
};

struct MockStore;

impl EntityStore for MockStore {
    fn insert_memory(&self, _: &Memory) -> VerityResult<()> {
        Ok(())
    }
    fn get_memory(&self, _: &str) -> VerityResult<Option<Memory>> {
        Ok(None)
    }
    fn update_memory(&self, _: &Memory) -> VerityResult<()> {
        Ok(())
    }
    fn delete_memory(&self, _: &str) -> VerityResult<()> {
        Ok(())
    }
    fn find_by_content_hash(&self, _: &str) -> VerityResult<Vec<Memory>> {
        Ok(vec![])
    }
    fn find_pending_exposure(&self, _: DateTime<Utc>, _: usize) -> VerityResult<Vec<Memory>> {
        Ok(vec![])
    }
    fn find_due_for_resolution(&self, _: DateTime<Utc>) -> VerityResult<Vec<Memory>> {
        Ok(vec![])
    }
        fn scan_memories(&self, _: usize) -> VerityResult<Vec<Memory>> {
            Ok(vec![])
        }
    fn insert_edge(&self, _: &Edge) -> VerityResult<()> {
        Ok(())
    }
    fn delete_edge(&self, _: &str, _: &str, _: EdgeType) -> VerityResult<()> {
        Ok(())
    }
    fn outgoing_edges(&self, _: &str, _: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
        Ok(vec![])
    }
    fn incoming_edges(&self, _: &str, _: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
        Ok(vec![])
    }
    fn all_signed_edges(&self) -> VerityResult<Vec<Edge>> {
        Ok(vec![])
    }
    fn insert_version(&self, _: &VersionSnapshot) -> VerityResult<()> {
        Ok(())
    }
    fn history(&self, _: &str) -> VerityResult<Vec<VersionSnapshot>> {
        Ok(vec![])
    }
    fn record_access(&self, _: &AccessEvent) -> VerityResult<()> {
        Ok(())
    }
    fn access_log(&self, _: &str, _: usize) -> VerityResult<Vec<AccessEvent>> {
        Ok(vec![])
    }
    fn enqueue_event(&self, _: &MemoryEvent) -> VerityResult<()> {
        Ok(())
    }
    fn find_inactive_sessions(&self, _: DateTime<Utc>) -> VerityResult<Vec<String>> {
        Ok(vec![])
    }
    fn claim_events(&self, _: &str, _: usize) -> VerityResult<Vec<MemoryEvent>> {
        Ok(vec![])
    }
    fn mark_event_dispatched(&self, _: &str, _: Option<&str>) -> VerityResult<()> {
        Ok(())
    }
    fn release_stuck_events(&self, _: Duration) -> VerityResult<usize> {
        Ok(0)
    }
    fn insert_notification(&self, _: &Notification) -> VerityResult<()> {
        Ok(())
    }
    fn get_stat(&self, _: &str) -> VerityResult<Option<f64>> {
        Ok(None)
    }
    fn set_stat(&self, _: &str, _: f64) -> VerityResult<()> {
        Ok(())
    }
    fn vacuum(&self) -> VerityResult<()> {
        Ok(())
    }
}

struct MockEmbedder;

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> VerityResult<Vec<f32>> {
        Ok(vec![text.len() as f32])
    }
    fn dimensions(&self) -> usize {
        1
    }
    fn name(&self) -> &str {
        "mock"
    }
}

struct MockIndex;

impl IndexStore for MockIndex {
    fn upsert(&self, _: &str, _: &[f32]) -> VerityResult<()> {
        Ok(())
    }
    fn delete_by_prefix(&self, _: &str) -> VerityResult<usize> {
        Ok(0)
    }
    fn delete(&self, _: &str) -> VerityResult<()> {
        Ok(())
    }
    fn query(&self, _: &[f32], _: usize, _: f64) -> VerityResult<Vec<(String, f64)>> {
        Ok(vec![])
    }
    fn len(&self) -> usize {
        0
    }
}

struct MockArbiter;

impl ThesisArbiter for MockArbiter {
    fn judge(&self, old: &str, new: &str) -> VerityResult<ThesisVerdict> {
        if old == new {
            Ok(ThesisVerdict::SameThesis)
        } else {
            Ok(ThesisVerdict::ChangedThesis)
        }
    }
}

#[derive(Default)]
struct MockQueue {
    jobs: Mutex<Vec<ExposureJob>>,
}

impl ExposureQueue for MockQueue {
    fn enqueue(&self, job: ExposureJob) -> VerityResult<()> {
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
    fn drain(&self, limit: usize) -> VerityResult<Vec<ExposureJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let n = limit.min(jobs.len());
        Ok(jobs.drain(..n).collect())
    }
    fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }
}

#[test]
fn queue_drain_respects_limit_and_leaves_the_rest() {
    let queue = MockQueue::default();
    for i in 0..3 {
        queue
            .enqueue(ExposureJob {
                memory_id: format!("m{i}"),
                content: String::new(),
                embedding: vec![],
                invalidates_conditions: vec![],
                confirms_conditions: vec![],
                time_bound: false,
                session_id: None,
                request_id: None,
                enqueued_at: Utc::now(),
            })
            .unwrap();
    }

    let drained = queue.drain(2).unwrap();
    assert_eq!(drained.len(), 2);
    assert_eq!(queue.len(), 1);
}

struct MockShock;

impl ShockPropagator for MockShock {
    fn propagate(&self, seed_id: &str, magnitude: f64) -> VerityResult<ShockResult> {
        Ok(ShockResult {
            updates: HashMap::from([(seed_id.to_string(), -magnitude)]),
            iterations: 1,
            backtracks: 0,
            converged: true,
        })
    }
}

#[test]
fn shock_propagator_reports_convergence() {
    let shock = MockShock;
    let result = shock.propagate("seed", 0.4).unwrap();
    assert!(result.converged);
    assert_eq!(result.updates["seed"], -0.4);
}

#[test]
fn embed_batch_defaults_to_per_item_embed() {
    let embedder = MockEmbedder;
    let out = embedder
        .embed_batch(&["a".to_string(), "bb".to_string()])
        .unwrap();
    assert_eq!(out, vec![vec![1.0f32], vec![2.0f32]]);
}

#[test]
fn index_is_empty_follows_len() {
    let index = MockIndex;
    assert!(index.is_empty());
}

#[test]
fn arbiter_distinguishes_identical_content() {
    let arbiter = MockArbiter;
    assert_eq!(arbiter.judge("a", "a").unwrap(), ThesisVerdict::SameThesis);
    assert_eq!(arbiter.judge("a", "b").unwrap(), ThesisVerdict::ChangedThesis);
}

#[test]
fn store_mock_satisfies_trait_object_safety() {
    let store: Box<dyn EntityStore> = Box::new(MockStore);
    assert!(store.get_memory("missing").unwrap().is_none());
}

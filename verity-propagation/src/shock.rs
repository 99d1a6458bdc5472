//! C5 — local shock cascade: the impulse of a core violation traveling
//! outward along support edges, damped per hop, with a spectral-radius
//! backtracking guard.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use verity_core::config::ShockConfig;
use verity_core::errors::VerityResult;
use verity_core::traits::{EntityStore, ShockPropagator, ShockResult};

use crate::graph::BeliefGraph;

pub struct LocalShockPropagator {
    store: Arc<dyn EntityStore>,
    config: ShockConfig,
}

impl LocalShockPropagator {
    pub fn new(store: Arc<dyn EntityStore>, config: ShockConfig) -> Self {
        Self { store, config }
    }

    /// One depth-bounded relaxation pass from `seed` at step size `h0`.
    /// Where a node is reachable via more than one path, the strongest
    /// incoming shock wins — a single wave, not an accumulating stack.
    fn run_once(&self, seed: &str, h0: f64) -> VerityResult<(HashMap<String, f64>, usize, bool)> {
        let edges = BeliefGraph::bfs_support_frontier(self.store.as_ref(), seed, self.config.max_depth)?;

        let mut h: HashMap<String, f64> = HashMap::new();
        h.insert(seed.to_string(), h0);

        let mut iterations = 0;
        let mut converged = false;

        for depth in 1..=self.config.max_depth {
            let mut layer_max = 0.0f64;
            for (edge_depth, edge) in &edges {
                if *edge_depth != depth {
                    continue;
                }
                let Some(&parent_h) = h.get(&edge.source_id) else { continue };
                let candidate = parent_h * edge.strength * self.config.gamma;
                let entry = h.entry(edge.target_id.clone()).or_insert(0.0);
                if candidate > *entry {
                    *entry = candidate;
                }
                layer_max = layer_max.max(candidate);
            }
            iterations += 1;
            if layer_max < self.config.convergence_eps {
                converged = true;
                break;
            }
            if iterations >= self.config.max_iterations {
                break;
            }
        }

        h.remove(seed);
        Ok((h, iterations, converged))
    }

    /// Power-iteration estimate of the dominant eigenvalue magnitude of the
    /// weighted adjacency matrix over the reachable subgraph.
    fn spectral_radius(&self, seed: &str) -> VerityResult<f64> {
        let edges = BeliefGraph::bfs_support_frontier(self.store.as_ref(), seed, self.config.max_depth)?;
        if edges.is_empty() {
            return Ok(0.0);
        }

        let mut ids: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        for (_, edge) in &edges {
            for id in [&edge.source_id, &edge.target_id] {
                index.entry(id.clone()).or_insert_with(|| {
                    ids.push(id.clone());
                    ids.len() - 1
                });
            }
        }
        let n = ids.len();
        let mut adjacency = vec![0.0f64; n * n];
        for (_, edge) in &edges {
            let i = index[&edge.source_id];
            let j = index[&edge.target_id];
            adjacency[i * n + j] = edge.strength;
        }

        let mut v = vec![1.0f64 / (n as f64).sqrt(); n];
        let mut lambda = 0.0;
        for _ in 0..self.config.power_iteration_steps {
            let mut next = vec![0.0f64; n];
            for i in 0..n {
                for j in 0..n {
                    next[i] += adjacency[i * n + j] * v[j];
                }
            }
            let norm = next.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm < f64::EPSILON {
                return Ok(0.0);
            }
            lambda = norm;
            for x in next.iter_mut() {
                *x /= norm;
            }
            v = next;
        }
        Ok(lambda)
    }
}

impl ShockPropagator for LocalShockPropagator {
    fn propagate(&self, seed_id: &str, magnitude: f64) -> VerityResult<ShockResult> {
        let mut h0 = magnitude;
        let mut backtracks = 0;
        let (mut h, mut iterations, mut converged) = self.run_once(seed_id, h0)?;

        // Damped gamma is part of the operator whose dominant eigenvalue we're
        // bounding: iterate-by-one-hop is literally `h <- gamma * A^T * h`.
        while self.spectral_radius(seed_id)? * self.config.gamma > 1.0 && backtracks < self.config.max_backtracks {
            backtracks += 1;
            h0 /= 2.0;
            warn!(seed_id, backtracks, h0, "shock cascade spectral radius guard tripped, halving step size");
            let (next_h, next_iterations, next_converged) = self.run_once(seed_id, h0)?;
            h = next_h;
            iterations = next_iterations;
            converged = next_converged;
        }

        debug!(seed_id, iterations, backtracks, nodes = h.len(), "shock cascade complete");

        let mut updates = HashMap::new();
        for (id, shock) in h {
            if shock <= 0.0 {
                continue;
            }
            let Some(memory) = self.store.get_memory(&id)? else { continue };
            if memory.is_observation() || memory.retracted {
                continue;
            }
            updates.insert(id, -shock);
        }

        Ok(ShockResult { updates, iterations, backtracks, converged })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use verity_core::constants::DEFAULT_STARTING_CONFIDENCE;
    use verity_core::memory::{
        Confidence, Edge, EdgeType, EdgeTypeFilter, ExposureStatus, Memory, MemoryState, Origin,
    };
    use verity_core::models::{AccessEvent, MemoryEvent, Notification, VersionSnapshot};
    use std::sync::Mutex;

    struct MemStore {
        edges: Mutex<Vec<Edge>>,
        memories: Mutex<HashMap<String, Memory>>,
    }

    impl MemStore {
        fn new() -> Self {
            Self { edges: Mutex::new(vec![]), memories: Mutex::new(HashMap::new()) }
        }

        fn seed(&self, id: &str, origin: Origin) {
            let now = Utc::now();
            self.memories.lock().unwrap().insert(
                id.to_string(),
                Memory {
                    id: id.to_string(),
                    content: format!("memory {id}"),
                    origin,
                    resolves_by: None,
                    outcome_condition: None,
                    assumes: vec![],
                    invalidates_if: vec![],
                    confirms_if: vec![],
                    tags: vec![],
                    starting_confidence: Confidence::new(DEFAULT_STARTING_CONFIDENCE),
                    confirmations: 0,
                    times_tested: 0,
                    contradictions: 0,
                    centrality: 0,
                    propagated_confidence: None,
                    created_at: now,
                    updated_at: now,
                    state: MemoryState::Active,
                    retracted: false,
                    retracted_at: None,
                    retraction_reason: None,
                    violations: vec![],
                    resolution_outcome: None,
                    resolved_at: None,
                    exposure_status: ExposureStatus::Ready,
                    content_hash: "h".to_string(),
                    agent_id: None,
                },
            );
        }

        fn link(&self, source: &str, target: &str, edge_type: EdgeType, strength: f64) {
            self.edges.lock().unwrap().push(Edge { source_id: source.to_string(), target_id: target.to_string(), edge_type, strength, created_at: Utc::now() });
        }
    }

    impl EntityStore for MemStore {
        fn insert_memory(&self, _: &Memory) -> VerityResult<()> {
            Ok(())
        }
        fn get_memory(&self, id: &str) -> VerityResult<Option<Memory>> {
            Ok(self.memories.lock().unwrap().get(id).cloned())
        }
        fn update_memory(&self, memory: &Memory) -> VerityResult<()> {
            self.memories.lock().unwrap().insert(memory.id.clone(), memory.clone());
            Ok(())
        }
        fn delete_memory(&self, _: &str) -> VerityResult<()> {
            Ok(())
        }
        fn find_by_content_hash(&self, _: &str) -> VerityResult<Vec<Memory>> {
            Ok(vec![])
        }
        fn find_pending_exposure(&self, _: chrono::DateTime<Utc>, _: usize) -> VerityResult<Vec<Memory>> {
            Ok(vec![])
        }
        fn find_due_for_resolution(&self, _: chrono::DateTime<Utc>) -> VerityResult<Vec<Memory>> {
            Ok(vec![])
        }
        fn scan_memories(&self, _: usize) -> VerityResult<Vec<Memory>> {
            Ok(vec![])
        }
        fn insert_edge(&self, edge: &Edge) -> VerityResult<()> {
            self.edges.lock().unwrap().push(edge.clone());
            Ok(())
        }
        fn delete_edge(&self, _: &str, _: &str, _: EdgeType) -> VerityResult<()> {
            Ok(())
        }
        fn outgoing_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
            Ok(self.edges.lock().unwrap().iter().filter(|e| e.source_id == memory_id && filter.matches(e.edge_type)).cloned().collect())
        }
        fn incoming_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
            Ok(self.edges.lock().unwrap().iter().filter(|e| e.target_id == memory_id && filter.matches(e.edge_type)).cloned().collect())
        }
        fn all_signed_edges(&self) -> VerityResult<Vec<Edge>> {
            Ok(self.edges.lock().unwrap().clone())
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
        fn find_inactive_sessions(&self, _: chrono::DateTime<Utc>) -> VerityResult<Vec<String>> {
            Ok(vec![])
        }
        fn claim_events(&self, _: &str, _: usize) -> VerityResult<Vec<MemoryEvent>> {
            Ok(vec![])
        }
        fn mark_event_dispatched(&self, _: &str, _: Option<&str>) -> VerityResult<()> {
            Ok(())
        }
        fn release_stuck_events(&self, _: chrono::Duration) -> VerityResult<usize> {
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

    #[test]
    fn cascade_decays_with_depth_and_skips_observations() {
        let store = Arc::new(MemStore::new());
        store.seed("a", Origin::Thought { derived_from: vec![] });
        store.seed("b", Origin::Thought { derived_from: vec!["a".to_string()] });
        store.seed("c", Origin::Observation { source: "feed".to_string() });
        store.link("a", "b", EdgeType::DerivedFrom, 0.9);
        store.link("a", "c", EdgeType::DerivedFrom, 0.9);

        let propagator = LocalShockPropagator::new(store.clone(), ShockConfig::default());
        let result = propagator.propagate("a", 0.4).unwrap();

        assert!(result.updates.contains_key("b"));
        assert!(!result.updates.contains_key("c"), "observations are never shocked");
        assert!(result.updates["b"] < 0.0);
    }

    #[test]
    fn cascade_is_empty_beyond_the_reachable_frontier() {
        let store = Arc::new(MemStore::new());
        store.seed("isolated", Origin::Thought { derived_from: vec![] });

        let propagator = LocalShockPropagator::new(store, ShockConfig::default());
        let result = propagator.propagate("isolated", 0.4).unwrap();
        assert!(result.updates.is_empty());
    }

    #[test]
    fn shock_never_exceeds_depth_limited_reach() {
        let store = Arc::new(MemStore::new());
        store.seed("a", Origin::Thought { derived_from: vec![] });
        for i in 0..6 {
            store.seed(&format!("n{i}"), Origin::Thought { derived_from: vec![] });
        }
        store.link("a", "n0", EdgeType::DerivedFrom, 1.0);
        for i in 0..5 {
            store.link(&format!("n{i}"), &format!("n{}", i + 1), EdgeType::DerivedFrom, 1.0);
        }

        let mut config = ShockConfig::default();
        config.max_depth = 2;
        let propagator = LocalShockPropagator::new(store, config);
        let result = propagator.propagate("a", 0.4).unwrap();

        assert!(result.updates.contains_key("n0"));
        assert!(result.updates.contains_key("n1"));
        assert!(!result.updates.contains_key("n2"), "n2 is 3 hops away, beyond max_depth=2");
    }
}

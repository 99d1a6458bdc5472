//! Zone construction: candidate gathering, Harary 2-coloring, boundary
//! accounting, and the quality score, mirroring the BFS/DFS traversal idiom
//! used for reachability elsewhere in the graph crates.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use verity_core::config::ZoneConfig;
use verity_core::errors::VerityResult;
use verity_core::memory::{EdgeType, EdgeTypeFilter, Memory};
use verity_core::traits::EntityStore;
use verity_index::ConditionIndexes;

use crate::model::{BoundaryEdge, BoundaryReason, Color, ColoringConflict, ZoneEdge, ZoneMember, ZoneReport};

pub struct ZoneBuilder {
    store: Arc<dyn EntityStore>,
    indexes: Arc<ConditionIndexes>,
    config: ZoneConfig,
}

impl ZoneBuilder {
    pub fn new(store: Arc<dyn EntityStore>, indexes: Arc<ConditionIndexes>, config: ZoneConfig) -> Self {
        Self { store, indexes, config }
    }

    pub fn build(&self, seed: &str, query: Option<&str>, depth: Option<usize>, top_k: Option<usize>) -> VerityResult<ZoneReport> {
        let depth = depth.unwrap_or(self.config.max_depth).min(self.config.max_depth);

        let mut candidate_ids = self.gather_neighborhood(seed, depth)?;
        if let Some(q) = query {
            for id in self.semantic_candidates(seed, q, top_k.unwrap_or(self.config.default_semantic_top_k))? {
                candidate_ids.insert(id);
            }
        }
        candidate_ids.insert(seed.to_string());

        let mut memories: HashMap<String, Memory> = HashMap::new();
        for id in &candidate_ids {
            if let Some(memory) = self.store.get_memory(id)? {
                if !memory.retracted && !is_overwhelmingly_violated(&memory) {
                    memories.insert(id.clone(), memory);
                }
            }
        }

        let member_ids: HashSet<String> = memories.keys().cloned().collect();
        let internal_edges = self.induced_edges(&member_ids)?;

        let (colors, conflicts) = color_components(&member_ids, &internal_edges);
        let safe = conflicts.is_empty();

        let boundary = self.boundary_edges(&member_ids)?;
        let cut_minus = boundary.iter().filter(|b| b.reason == BoundaryReason::CutMinus).count();
        let loss_plus = boundary.iter().filter(|b| b.reason == BoundaryReason::LossPlus).count();

        let members: Vec<ZoneMember> = memories
            .values()
            .map(|m| ZoneMember { id: m.id.clone(), color: colors[&m.id], confidence: m.effective_confidence() })
            .collect();

        let score = score_zone(&members, cut_minus, loss_plus, self.config.lambda, self.config.rho);

        Ok(ZoneReport {
            seed: seed.to_string(),
            members,
            internal_edges,
            boundary,
            cut_minus,
            loss_plus,
            safe,
            conflicts,
            score,
        })
    }

    /// BFS up to `depth` hops over all non-`violated_by` edges, treating
    /// direction as irrelevant: both outgoing and incoming edges widen the
    /// frontier.
    fn gather_neighborhood(&self, seed: &str, depth: usize) -> VerityResult<HashSet<String>> {
        let mut visited = HashSet::new();
        visited.insert(seed.to_string());
        let mut frontier = VecDeque::new();
        frontier.push_back((seed.to_string(), 0usize));

        while let Some((node, hops)) = frontier.pop_front() {
            if hops >= depth {
                continue;
            }
            let mut neighbors = self.store.outgoing_edges(&node, EdgeTypeFilter::default())?;
            neighbors.extend(self.store.incoming_edges(&node, EdgeTypeFilter::default())?);
            for edge in neighbors {
                if edge.edge_type == EdgeType::ViolatedBy {
                    continue;
                }
                let other = if edge.source_id == node { edge.target_id } else { edge.source_id };
                if visited.insert(other.clone()) {
                    frontier.push_back((other, hops + 1));
                }
            }
        }
        Ok(visited)
    }

    fn semantic_candidates(&self, seed: &str, query: &str, top_k: usize) -> VerityResult<Vec<String>> {
        let seed_content = self.store.get_memory(seed)?.map(|m| m.content).unwrap_or_default();
        let combined = format!("{seed_content} {query}");
        let vector = self.indexes.embed_cached(&Memory::compute_content_hash(&combined), &combined)?;
        let hits = self.indexes.query_content(&vector, top_k, 0.0)?;
        Ok(hits.into_iter().map(|(id, _, _)| id).collect())
    }

    fn induced_edges(&self, members: &HashSet<String>) -> VerityResult<Vec<ZoneEdge>> {
        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for id in members {
            for edge in self.store.outgoing_edges(id, EdgeTypeFilter::default())? {
                if !members.contains(&edge.target_id) {
                    continue;
                }
                let key = (edge.source_id.clone(), edge.target_id.clone(), edge.edge_type);
                if seen.insert(key) {
                    edges.push(ZoneEdge { source_id: edge.source_id, target_id: edge.target_id, edge_type: edge.edge_type, strength: edge.strength });
                }
            }
        }
        Ok(edges)
    }

    fn boundary_edges(&self, members: &HashSet<String>) -> VerityResult<Vec<BoundaryEdge>> {
        let mut boundary = Vec::new();
        for id in members {
            for edge in self.store.outgoing_edges(id, EdgeTypeFilter::default())? {
                if members.contains(&edge.target_id) {
                    continue;
                }
                if edge.edge_type.is_contradiction() {
                    boundary.push(BoundaryEdge {
                        source_id: edge.source_id,
                        target_id: edge.target_id,
                        edge_type: edge.edge_type,
                        strength: edge.strength,
                        reason: BoundaryReason::CutMinus,
                    });
                }
            }
            for edge in self.store.incoming_edges(id, EdgeTypeFilter::default())? {
                if members.contains(&edge.source_id) {
                    continue;
                }
                if edge.edge_type.is_contradiction() {
                    boundary.push(BoundaryEdge {
                        source_id: edge.source_id,
                        target_id: edge.target_id,
                        edge_type: edge.edge_type,
                        strength: edge.strength,
                        reason: BoundaryReason::CutMinus,
                    });
                } else if edge.edge_type.is_support() {
                    boundary.push(BoundaryEdge {
                        source_id: edge.source_id,
                        target_id: edge.target_id,
                        edge_type: edge.edge_type,
                        strength: edge.strength,
                        reason: BoundaryReason::LossPlus,
                    });
                }
            }
        }
        Ok(boundary)
    }
}

fn is_overwhelmingly_violated(memory: &Memory) -> bool {
    if memory.violations.is_empty() {
        return false;
    }
    memory.confirmations == 0 || (memory.confirmations as f64 / memory.times_tested.max(1) as f64) < 0.5
}

/// BFS per connected component of the induced subgraph: support edges force
/// the same color, contradiction edges force the opposite one. A violated
/// constraint is recorded but doesn't stop the walk, so the report can list
/// every conflict rather than just the first one found.
fn color_components(members: &HashSet<String>, edges: &[ZoneEdge]) -> (HashMap<String, Color>, Vec<ColoringConflict>) {
    let mut adjacency: HashMap<&str, Vec<&ZoneEdge>> = HashMap::new();
    for edge in edges {
        adjacency.entry(edge.source_id.as_str()).or_default().push(edge);
        adjacency.entry(edge.target_id.as_str()).or_default().push(edge);
    }

    let mut colors: HashMap<String, Color> = HashMap::new();
    let mut conflicts = Vec::new();
    let mut reported: HashSet<(String, String, EdgeType)> = HashSet::new();

    for start in members {
        if colors.contains_key(start) {
            continue;
        }
        colors.insert(start.clone(), Color::A);
        let mut queue = VecDeque::new();
        queue.push_back(start.clone());

        while let Some(node) = queue.pop_front() {
            let node_color = colors[&node];
            let Some(incident) = adjacency.get(node.as_str()) else { continue };
            for edge in incident {
                let other = if edge.source_id == node { &edge.target_id } else { &edge.source_id };
                let expected = if edge.edge_type.is_support() { node_color } else { node_color.flip() };
                match colors.get(other) {
                    None => {
                        colors.insert(other.clone(), expected);
                        queue.push_back(other.clone());
                    }
                    Some(&actual) if actual != expected => {
                        let key = (edge.source_id.clone(), edge.target_id.clone(), edge.edge_type);
                        if reported.insert(key) {
                            conflicts.push(ColoringConflict {
                                source_id: edge.source_id.clone(),
                                target_id: edge.target_id.clone(),
                                edge_type: edge.edge_type,
                            });
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    (colors, conflicts)
}

fn score_zone(members: &[ZoneMember], cut_minus: usize, loss_plus: usize, lambda: f64, rho: f64) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    let mean_conf = members.iter().map(|m| m.confidence).sum::<f64>() / members.len() as f64;
    let z = members.len() as f64;
    let raw = mean_conf - lambda * (cut_minus as f64 / z) - rho * (loss_plus as f64 / z);
    raw.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;
    use verity_core::constants::DEFAULT_STARTING_CONFIDENCE;
    use verity_core::memory::{Confidence, Edge, ExposureStatus, MemoryState, Origin, Violation, DamageLevel};
    use verity_core::models::{AccessEvent, MemoryEvent, Notification, VersionSnapshot};
    use verity_index::HashingEmbedder;

    struct MemStore {
        edges: Mutex<Vec<Edge>>,
        memories: Mutex<HashMap<String, Memory>>,
    }

    impl MemStore {
        fn new() -> Self {
            Self { edges: Mutex::new(vec![]), memories: Mutex::new(HashMap::new()) }
        }

        fn seed(&self, id: &str, confirmations: u32, times_tested: u32, violated: bool) {
            let now = Utc::now();
            let violations = if violated {
                vec![Violation { condition: "c".into(), observed_at: now, observation_id: None, damage_level: DamageLevel::Peripheral }]
            } else {
                vec![]
            };
            self.memories.lock().unwrap().insert(
                id.to_string(),
                Memory {
                    id: id.to_string(),
                    content: format!("memory {id}"),
                    origin: Origin::Thought { derived_from: vec![] },
                    resolves_by: None,
                    outcome_condition: None,
                    assumes: vec![],
                    invalidates_if: vec![],
                    confirms_if: vec![],
                    tags: vec![],
                    starting_confidence: Confidence::new(DEFAULT_STARTING_CONFIDENCE),
                    confirmations,
                    times_tested,
                    contradictions: 0,
                    centrality: 0,
                    propagated_confidence: None,
                    created_at: now,
                    updated_at: now,
                    state: MemoryState::Active,
                    retracted: false,
                    retracted_at: None,
                    retraction_reason: None,
                    violations,
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

    fn builder(store: Arc<MemStore>) -> ZoneBuilder {
        let indexes = Arc::new(ConditionIndexes::new(Arc::new(HashingEmbedder::new(64))));
        ZoneBuilder::new(store, indexes, ZoneConfig::default())
    }

    #[test]
    fn a_support_chain_colors_every_member_the_same() {
        let store = Arc::new(MemStore::new());
        store.seed("a", 5, 5, false);
        store.seed("b", 5, 5, false);
        store.link("a", "b", EdgeType::DerivedFrom, 0.9);

        let report = builder(store).build("a", None, None, None).unwrap();
        assert!(report.safe);
        let colors: HashSet<Color> = report.members.iter().map(|m| m.color).collect();
        assert_eq!(colors.len(), 1);
    }

    #[test]
    fn a_contradiction_edge_forces_opposite_colors_and_is_not_a_conflict() {
        let store = Arc::new(MemStore::new());
        store.seed("a", 5, 5, false);
        store.seed("b", 0, 5, true);
        store.link("a", "b", EdgeType::ViolatedBy, 0.9);

        let report = builder(store).build("a", None, Some(2), None).unwrap();
        let a_color = report.members.iter().find(|m| m.id == "a").unwrap().color;
        let b_color = report.members.iter().find(|m| m.id == "b");
        // b is overwhelmingly violated (0 confirmations) and dropped, so its
        // contradiction edge surfaces only on the boundary.
        assert!(b_color.is_none());
        assert_eq!(report.cut_minus, 1);
        let _ = a_color;
    }

    #[test]
    fn a_triangle_with_an_odd_number_of_negative_edges_is_unsafe() {
        let store = Arc::new(MemStore::new());
        store.seed("a", 5, 5, false);
        store.seed("b", 5, 5, false);
        store.seed("c", 5, 5, false);
        store.link("a", "b", EdgeType::DerivedFrom, 0.9);
        store.link("b", "c", EdgeType::DerivedFrom, 0.9);
        store.link("a", "c", EdgeType::ViolatedBy, 0.9);

        let report = builder(store).build("a", None, Some(2), None).unwrap();
        assert!(!report.safe);
        assert_eq!(report.conflicts.len(), 1);
    }

    #[test]
    fn an_overwhelmingly_violated_memory_is_excluded() {
        let store = Arc::new(MemStore::new());
        store.seed("a", 5, 5, false);
        store.seed("b", 1, 10, true);
        store.link("a", "b", EdgeType::DerivedFrom, 0.9);

        let report = builder(store).build("a", None, Some(2), None).unwrap();
        assert!(report.members.iter().all(|m| m.id != "b"));
    }
}

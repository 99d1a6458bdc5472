//! A petgraph view of the signed belief graph, mirroring `cortex-causal`'s
//! `IndexedGraph` node-index bookkeeping.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::unionfind::UnionFind;

use verity_core::errors::VerityResult;
use verity_core::memory::{Edge, EdgeTypeFilter};
use verity_core::traits::EntityStore;

pub struct BeliefGraph {
    pub graph: StableDiGraph<String, f64>,
    index: HashMap<String, NodeIndex>,
}

impl BeliefGraph {
    pub fn new() -> Self {
        Self { graph: StableDiGraph::new(), index: HashMap::new() }
    }

    pub fn get_node(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    fn get_or_insert(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    fn add_edge(&mut self, source: &str, target: &str, strength: f64) {
        let s = self.get_or_insert(source);
        let t = self.get_or_insert(target);
        self.graph.add_edge(s, t, strength);
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.graph.node_weights().cloned().collect()
    }

    /// The positive-edge subgraph (`derived_from` ∪ `confirmed_by`, strength
    /// at or above `min_strength`) used by the full-graph propagator (C6).
    /// Component discovery over this subgraph ignores contradictions so a
    /// single `violated_by` edge can't merge two otherwise-unrelated clusters.
    pub fn load_positive_subgraph(store: &dyn EntityStore, min_strength: f64) -> VerityResult<Self> {
        let mut g = Self::new();
        for edge in store.all_signed_edges()? {
            if edge.edge_type.is_support() && edge.strength >= min_strength {
                g.add_edge(&edge.source_id, &edge.target_id, edge.strength);
            }
        }
        Ok(g)
    }

    /// Weakly-connected components of the loaded subgraph, via `petgraph`'s
    /// `UnionFind` over edges treated as undirected.
    pub fn weak_components(&self) -> Vec<Vec<String>> {
        let mut uf = UnionFind::new(self.graph.node_count());
        for edge in self.graph.edge_indices() {
            if let Some((a, b)) = self.graph.edge_endpoints(edge) {
                uf.union(a.index(), b.index());
            }
        }

        let mut groups: HashMap<usize, Vec<String>> = HashMap::new();
        for idx in self.graph.node_indices() {
            let root = uf.find(idx.index());
            groups.entry(root).or_default().push(self.graph[idx].clone());
        }
        groups.into_values().collect()
    }

    /// BFS the support subgraph reachable from `seed` via outgoing edges, up
    /// to `max_depth` hops, queried directly against the store rather than
    /// materializing the whole graph (a local cascade never needs it).
    pub fn bfs_support_frontier(store: &dyn EntityStore, seed: &str, max_depth: usize) -> VerityResult<Vec<(usize, Edge)>> {
        let mut frontier_edges = Vec::new();
        let mut frontier = vec![seed.to_string()];
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(seed.to_string());

        for depth in 1..=max_depth {
            let mut next_frontier = Vec::new();
            for node in &frontier {
                for edge in store.outgoing_edges(node, EdgeTypeFilter::default())? {
                    if !edge.edge_type.is_support() {
                        continue;
                    }
                    let first_visit = visited.insert(edge.target_id.clone());
                    frontier_edges.push((depth, edge.clone()));
                    if first_visit {
                        next_frontier.push(edge.target_id.clone());
                    }
                }
            }
            if next_frontier.is_empty() {
                break;
            }
            frontier = next_frontier;
        }
        Ok(frontier_edges)
    }
}

impl Default for BeliefGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use verity_core::memory::{Edge, EdgeType};
    use verity_core::models::{AccessEvent, MemoryEvent, Notification, VersionSnapshot};
    use verity_core::memory::Memory;

    struct FixtureStore {
        edges: Vec<Edge>,
    }

    impl EntityStore for FixtureStore {
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
        fn find_pending_exposure(&self, _: chrono::DateTime<Utc>, _: usize) -> VerityResult<Vec<Memory>> {
            Ok(vec![])
        }
        fn find_due_for_resolution(&self, _: chrono::DateTime<Utc>) -> VerityResult<Vec<Memory>> {
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
        fn outgoing_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
            Ok(self
                .edges
                .iter()
                .filter(|e| e.source_id == memory_id && filter.matches(e.edge_type))
                .cloned()
                .collect())
        }
        fn incoming_edges(&self, memory_id: &str, filter: EdgeTypeFilter) -> VerityResult<Vec<Edge>> {
            Ok(self
                .edges
                .iter()
                .filter(|e| e.target_id == memory_id && filter.matches(e.edge_type))
                .cloned()
                .collect())
        }
        fn all_signed_edges(&self) -> VerityResult<Vec<Edge>> {
            Ok(self.edges.clone())
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

    fn edge(source: &str, target: &str, edge_type: EdgeType, strength: f64) -> Edge {
        Edge { source_id: source.to_string(), target_id: target.to_string(), edge_type, strength, created_at: Utc::now() }
    }

    #[test]
    fn bfs_frontier_stops_at_max_depth() {
        let store = FixtureStore {
            edges: vec![
                edge("a", "b", EdgeType::DerivedFrom, 0.9),
                edge("b", "c", EdgeType::DerivedFrom, 0.9),
                edge("c", "d", EdgeType::DerivedFrom, 0.9),
            ],
        };
        let frontier = BeliefGraph::bfs_support_frontier(&store, "a", 2).unwrap();
        assert_eq!(frontier.len(), 2);
        assert!(frontier.iter().all(|(depth, _)| *depth <= 2));
    }

    #[test]
    fn bfs_frontier_ignores_contradiction_edges() {
        let store = FixtureStore { edges: vec![edge("a", "b", EdgeType::ViolatedBy, 0.9)] };
        let frontier = BeliefGraph::bfs_support_frontier(&store, "a", 4).unwrap();
        assert!(frontier.is_empty());
    }

    #[test]
    fn weak_components_group_by_undirected_reachability() {
        let store = FixtureStore {
            edges: vec![
                edge("a", "b", EdgeType::DerivedFrom, 0.9),
                edge("c", "d", EdgeType::ConfirmedBy, 0.9),
            ],
        };
        let graph = BeliefGraph::load_positive_subgraph(&store, 0.1).unwrap();
        let mut components = graph.weak_components();
        components.sort_by_key(|c| c.len());
        assert_eq!(components.len(), 2);
    }

    #[test]
    fn load_positive_subgraph_excludes_weak_edges() {
        let store = FixtureStore { edges: vec![edge("a", "b", EdgeType::DerivedFrom, 0.05)] };
        let graph = BeliefGraph::load_positive_subgraph(&store, 0.1).unwrap();
        assert_eq!(graph.node_ids().len(), 0);
    }
}

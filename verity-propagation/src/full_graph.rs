//! C6 — full-graph propagator: a nightly damped fixed-point iteration over
//! each connected component of the positive-edge subgraph.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use verity_core::config::PropagationConfig;
use verity_core::constants::DEFAULT_MAX_TIMES_TESTED;
use verity_core::errors::VerityResult;
use verity_core::memory::{clamp01, Confidence, EdgeTypeFilter, Memory};
use verity_core::models::evidence_weight;
use verity_core::traits::EntityStore;

use crate::graph::BeliefGraph;

/// Summary of one full-graph propagation pass, for logging/tests.
#[derive(Debug, Default)]
pub struct PropagationReport {
    pub components: usize,
    pub nodes_considered: usize,
    pub nodes_updated: usize,
    pub iterations: usize,
}

pub struct FullGraphPropagator {
    store: Arc<dyn EntityStore>,
    config: PropagationConfig,
}

impl FullGraphPropagator {
    pub fn new(store: Arc<dyn EntityStore>, config: PropagationConfig) -> Self {
        Self { store, config }
    }

    pub fn run(&self) -> VerityResult<PropagationReport> {
        let graph = BeliefGraph::load_positive_subgraph(self.store.as_ref(), self.config.min_strength)?;
        let components = graph.weak_components();
        let max_times_tested = self.store.get_stat("max_times_tested")?.unwrap_or(DEFAULT_MAX_TIMES_TESTED);

        let mut report = PropagationReport { components: components.len(), ..Default::default() };

        for component in components {
            let iterations = self.run_component(&component, max_times_tested, &mut report)?;
            report.iterations = report.iterations.max(iterations);
        }

        info!(
            components = report.components,
            nodes_considered = report.nodes_considered,
            nodes_updated = report.nodes_updated,
            iterations = report.iterations,
            "full-graph propagation pass complete"
        );
        Ok(report)
    }

    fn run_component(&self, member_ids: &[String], max_times_tested: f64, report: &mut PropagationReport) -> VerityResult<usize> {
        let mut memories: HashMap<String, Memory> = HashMap::new();
        for id in member_ids {
            if let Some(memory) = self.store.get_memory(id)? {
                if !memory.is_observation() && !memory.retracted {
                    memories.insert(id.clone(), memory);
                }
            }
        }
        if memories.is_empty() {
            return Ok(0);
        }
        report.nodes_considered += memories.len();

        let baseline: HashMap<String, f64> = memories
            .values()
            .map(|m| (m.id.clone(), local_confidence(m, max_times_tested)))
            .collect();

        let mut current: HashMap<String, f64> = memories
            .values()
            .map(|m| {
                let warm_start = m.propagated_confidence.map(|c| c.value()).unwrap_or(baseline[&m.id]);
                (m.id.clone(), warm_start)
            })
            .collect();

        let mut iterations = 0;
        for _ in 0..self.config.max_iterations {
            iterations += 1;
            let mut next = current.clone();
            let mut max_delta = 0.0f64;

            for id in memories.keys() {
                let (support, contradiction) = self.incoming_terms(id, &current, max_times_tested)?;
                let b = baseline[id];
                let updated = clamp01((1.0 - self.config.alpha) * b + self.config.alpha * (support - self.config.eta * contradiction));
                max_delta = max_delta.max((updated - current[id]).abs());
                next.insert(id.clone(), updated);
            }

            current = next;
            if max_delta < self.config.convergence_eps {
                break;
            }
        }

        for (id, value) in current {
            let memory = &memories[&id];
            let stored = memory.propagated_confidence.map(|c| c.value()).unwrap_or(baseline[&id]);
            if (value - stored).abs() <= self.config.convergence_eps {
                continue;
            }
            let mut updated = memory.clone();
            updated.propagated_confidence = Some(Confidence::new(value));
            updated.updated_at = chrono::Utc::now();
            self.store.update_memory(&updated)?;
            report.nodes_updated += 1;
        }

        debug!(component_size = memories.len(), iterations, "component propagation converged");
        Ok(iterations)
    }

    /// Strength-weighted mean of in-component support sources and the
    /// strength-weighted mean of contradiction sources (which may lie outside
    /// the component); contradiction sources fall back to their own current
    /// propagated confidence or local baseline.
    fn incoming_terms(&self, id: &str, current: &HashMap<String, f64>, max_times_tested: f64) -> VerityResult<(f64, f64)> {
        let mut support_sum = 0.0;
        let mut support_weight = 0.0;
        let mut contradiction_sum = 0.0;
        let mut contradiction_weight = 0.0;

        for edge in self.store.incoming_edges(id, EdgeTypeFilter::default())? {
            if edge.edge_type.is_support() {
                if let Some(&value) = current.get(&edge.source_id) {
                    support_sum += value * edge.strength;
                    support_weight += edge.strength;
                }
            } else if edge.edge_type.is_contradiction() {
                let value = if let Some(&v) = current.get(&edge.source_id) {
                    v
                } else if let Some(source) = self.store.get_memory(&edge.source_id)? {
                    source.propagated_confidence.map(|c| c.value()).unwrap_or_else(|| local_confidence(&source, max_times_tested))
                } else {
                    continue;
                };
                contradiction_sum += value * edge.strength;
                contradiction_weight += edge.strength;
            }
        }

        let support = if support_weight > 0.0 { support_sum / support_weight } else { 0.0 };
        let contradiction = if contradiction_weight > 0.0 { contradiction_sum / contradiction_weight } else { 0.0 };
        Ok((support, contradiction))
    }
}

fn local_confidence(memory: &Memory, max_times_tested: f64) -> f64 {
    let w = evidence_weight(memory.times_tested, Some(max_times_tested));
    let earned = memory.earned_ratio().unwrap_or(0.0);
    clamp01(memory.starting_confidence.value() * (1.0 - w) + earned * w)
}

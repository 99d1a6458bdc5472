//! C9 — resolution cascade: applying a time-bound memory's real-world outcome
//! back onto the graph, the same recover/shock split C4 uses for confirmation
//! and core violation.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use verity_core::constants::RECOVERY_MULTIPLIER;
use verity_core::errors::{VerityError, VerityResult};
use verity_core::memory::{Confidence, EdgeTypeFilter, MemoryState, ResolutionOutcome};
use verity_core::models::{EventType, MemoryEvent};
use verity_core::traits::{EntityStore, ShockPropagator};

pub struct Resolver {
    store: Arc<dyn EntityStore>,
    shock: Arc<dyn ShockPropagator>,
}

/// What the resolution did, for callers/tests that want a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub outcome: ResolutionOutcome,
    pub edges_recovered: usize,
    pub shock_triggered: bool,
}

impl Resolver {
    pub fn new(store: Arc<dyn EntityStore>, shock: Arc<dyn ShockPropagator>) -> Self {
        Self { store, shock }
    }

    pub fn resolve(&self, memory_id: &str, outcome: ResolutionOutcome) -> VerityResult<ResolutionSummary> {
        let Some(mut memory) = self.store.get_memory(memory_id)? else {
            return Err(VerityError::not_found(memory_id));
        };

        memory.resolution_outcome = Some(outcome);
        memory.resolved_at = Some(Utc::now());
        memory.state = MemoryState::Resolved;
        memory.updated_at = Utc::now();
        self.store.update_memory(&memory)?;

        let mut edges_recovered = 0;
        let mut shock_triggered = false;

        match outcome {
            ResolutionOutcome::Void => {}
            ResolutionOutcome::Correct => {
                edges_recovered = self.recover_support_edges(memory_id)?;
            }
            ResolutionOutcome::Incorrect => {
                let shock = self.shock.propagate(memory_id, verity_core::constants::CORE_SHOCK_MAGNITUDE)?;
                self.apply_shock(&shock)?;
                shock_triggered = true;
            }
        }

        self.store.enqueue_event(&MemoryEvent {
            id: Uuid::new_v4().to_string(),
            session_id: "unscoped".to_string(),
            event_type: EventType::Resolution,
            memory_id: memory_id.to_string(),
            violated_by: None,
            damage_level: None,
            context: serde_json::json!({ "outcome": outcome }),
            created_at: Utc::now(),
            dispatched: false,
            dispatched_at: None,
            workflow_id: None,
        })?;

        info!(memory_id, ?outcome, edges_recovered, shock_triggered, "memory resolved");
        Ok(ResolutionSummary { outcome, edges_recovered, shock_triggered })
    }

    fn recover_support_edges(&self, source_id: &str) -> VerityResult<usize> {
        let edges = self.store.outgoing_edges(source_id, EdgeTypeFilter::default())?;
        let mut recovered = 0;
        for mut edge in edges {
            if edge.edge_type.is_support() {
                edge.strength = (edge.strength * RECOVERY_MULTIPLIER).min(1.0);
                self.store.delete_edge(&edge.source_id, &edge.target_id, edge.edge_type)?;
                self.store.insert_edge(&edge)?;
                recovered += 1;
            }
        }
        Ok(recovered)
    }

    fn apply_shock(&self, shock: &verity_core::traits::ShockResult) -> VerityResult<()> {
        for (memory_id, delta) in &shock.updates {
            let Some(mut memory) = self.store.get_memory(memory_id)? else { continue };
            let current = memory.effective_confidence();
            memory.propagated_confidence = Some(Confidence::new(current + delta));
            memory.updated_at = Utc::now();
            self.store.update_memory(&memory)?;
        }
        Ok(())
    }
}

//! C4 — violation/confirmation detection, edge decay/recovery, auto-resolution.
//!
//! Grounded on `cortex-validation`'s dimension-scoring shape (run each check,
//! collect healing-style actions, apply them) generalized from a single
//! memory's validation score to a pairwise condition-match sweep.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use verity_core::constants::{CONDITION_MATCH_THRESHOLD, CORE_DECAY_FACTOR, PERIPHERAL_DECAY_FACTOR, RECOVERY_MULTIPLIER};
use verity_core::errors::VerityResult;
use verity_core::memory::{DamageLevel, Edge, EdgeType, EdgeTypeFilter, MemoryState, ResolutionOutcome, Violation};
use verity_core::models::{EventType, MemoryEvent, Notification, NotificationType};
use verity_core::traits::{EntityStore, ExposureJob, ShockPropagator};

use verity_index::named_indexes::ConditionIndexes;

/// What happened while checking one exposure job, for callers/tests that want
/// a summary rather than re-reading the store.
#[derive(Debug, Default)]
pub struct ExposureOutcome {
    pub violated: Vec<String>,
    pub confirmed: Vec<String>,
    pub core_violations: Vec<String>,
    pub auto_resolved: bool,
}

pub struct ExposureChecker {
    store: Arc<dyn EntityStore>,
    indexes: Arc<ConditionIndexes>,
    shock: Arc<dyn ShockPropagator>,
    min_similarity: f64,
}

impl ExposureChecker {
    pub fn new(store: Arc<dyn EntityStore>, indexes: Arc<ConditionIndexes>, shock: Arc<dyn ShockPropagator>, min_similarity: f64) -> Self {
        Self { store, indexes, shock, min_similarity }
    }

    pub fn check(&self, job: &ExposureJob) -> VerityResult<ExposureOutcome> {
        let mut outcome = ExposureOutcome::default();

        self.detect_violations(job, &mut outcome)?;
        self.detect_confirmations(job, &mut outcome)?;
        self.check_auto_resolution(job, &mut outcome)?;

        Ok(outcome)
    }

    /// Search the invalidates index with M's content vector: every match is a
    /// violation recorded against the *matched* memory N, not against M.
    fn detect_violations(&self, job: &ExposureJob, outcome: &mut ExposureOutcome) -> VerityResult<()> {
        let hits = self.indexes.query_invalidates(&job.embedding, 100, self.min_similarity)?;
        for (key, similarity, metadata) in hits {
            if similarity < CONDITION_MATCH_THRESHOLD {
                continue;
            }
            let Some(metadata) = metadata else { continue };
            let Some(memory_id) = metadata.get("memory_id").and_then(|v| v.as_str()) else { continue };
            if memory_id == job.memory_id {
                continue;
            }
            let condition_text = metadata.get("condition_text").and_then(|v| v.as_str()).unwrap_or_default();

            let Some(mut target) = self.store.get_memory(memory_id)? else { continue };
            if target.retracted {
                continue;
            }

            let damage_level = target.damage_level();
            target.violations.push(Violation {
                condition: condition_text.to_string(),
                observed_at: Utc::now(),
                observation_id: Some(job.memory_id.clone()),
                damage_level,
            });
            target.contradictions += 1;
            target.times_tested += 1;
            target.state = MemoryState::Violated;
            target.updated_at = Utc::now();
            self.store.update_memory(&target)?;

            self.store.insert_edge(&Edge::new(memory_id, job.memory_id.clone(), EdgeType::ViolatedBy))?;

            let delta = match damage_level {
                DamageLevel::Core => CORE_DECAY_FACTOR,
                DamageLevel::Peripheral => PERIPHERAL_DECAY_FACTOR,
            };
            self.decay_support_edges(memory_id, delta)?;

            if damage_level == DamageLevel::Core {
                let magnitude = verity_core::constants::CORE_SHOCK_MAGNITUDE;
                let shock = self.shock.propagate(memory_id, magnitude)?;
                self.apply_shock(&shock)?;

                self.store.insert_notification(&Notification {
                    id: uuid::Uuid::new_v4().to_string(),
                    notification_type: NotificationType::CoreViolation,
                    memory_id: memory_id.to_string(),
                    content: format!("core memory {memory_id} violated by {}", job.memory_id),
                    context: json!({"condition": condition_text, "observation_id": job.memory_id}),
                    read: false,
                    created_at: Utc::now(),
                })?;

                self.store.enqueue_event(&MemoryEvent {
                    id: uuid::Uuid::new_v4().to_string(),
                    session_id: job.session_id.clone().unwrap_or_else(|| "unscoped".to_string()),
                    event_type: EventType::CoreViolation,
                    memory_id: memory_id.to_string(),
                    violated_by: Some(job.memory_id.clone()),
                    damage_level: Some(damage_level),
                    context: json!({"condition": condition_text}),
                    created_at: Utc::now(),
                    dispatched: false,
                    dispatched_at: None,
                    workflow_id: None,
                })?;
                outcome.core_violations.push(memory_id.to_string());
            } else {
                self.store.enqueue_event(&MemoryEvent {
                    id: uuid::Uuid::new_v4().to_string(),
                    session_id: job.session_id.clone().unwrap_or_else(|| "unscoped".to_string()),
                    event_type: EventType::Violation,
                    memory_id: memory_id.to_string(),
                    violated_by: Some(job.memory_id.clone()),
                    damage_level: Some(damage_level),
                    context: json!({"condition": condition_text}),
                    created_at: Utc::now(),
                    dispatched: false,
                    dispatched_at: None,
                    workflow_id: None,
                })?;
            }

            outcome.violated.push(memory_id.to_string());
        }
        Ok(())
    }

    fn detect_confirmations(&self, job: &ExposureJob, outcome: &mut ExposureOutcome) -> VerityResult<()> {
        let hits = self.indexes.query_confirms(&job.embedding, 100, self.min_similarity)?;
        for (_key, similarity, metadata) in hits {
            if similarity < CONDITION_MATCH_THRESHOLD {
                continue;
            }
            let Some(metadata) = metadata else { continue };
            let Some(memory_id) = metadata.get("memory_id").and_then(|v| v.as_str()) else { continue };
            if memory_id == job.memory_id {
                continue;
            }

            let Some(mut target) = self.store.get_memory(memory_id)? else { continue };
            if target.retracted {
                continue;
            }

            target.confirmations += 1;
            target.times_tested += 1;
            target.updated_at = Utc::now();
            self.store.update_memory(&target)?;

            self.store.insert_edge(&Edge::new(memory_id, job.memory_id.clone(), EdgeType::ConfirmedBy))?;
            self.recover_support_edges(memory_id)?;

            self.store.enqueue_event(&MemoryEvent {
                id: uuid::Uuid::new_v4().to_string(),
                session_id: job.session_id.clone().unwrap_or_else(|| "unscoped".to_string()),
                event_type: EventType::Confirmation,
                memory_id: memory_id.to_string(),
                violated_by: None,
                damage_level: None,
                context: json!({}),
                created_at: Utc::now(),
                dispatched: false,
                dispatched_at: None,
                workflow_id: None,
            })?;

            outcome.confirmed.push(memory_id.to_string());
        }
        Ok(())
    }

    /// If M is itself time-bound and this job's content matches its own
    /// `outcome_condition`, resolve it. Only a content-vs-condition cosine
    /// check is available here; the caller's explicit `/resolve` path is the
    /// primary route and does not depend on this heuristic.
    fn check_auto_resolution(&self, job: &ExposureJob, outcome: &mut ExposureOutcome) -> VerityResult<()> {
        if !job.time_bound {
            return Ok(());
        }
        let Some(mut memory) = self.store.get_memory(&job.memory_id)? else { return Ok(()) };
        let Some(condition) = memory.outcome_condition.clone() else { return Ok(()) };

        let condition_vector = self.indexes.embedder().embed(&condition)?;
        let similarity = cosine(&job.embedding, &condition_vector);
        if similarity < CONDITION_MATCH_THRESHOLD {
            return Ok(());
        }

        memory.state = verity_core::memory::MemoryState::Resolved;
        memory.resolution_outcome = Some(ResolutionOutcome::Correct);
        memory.resolved_at = Some(Utc::now());
        memory.updated_at = Utc::now();
        self.store.update_memory(&memory)?;
        outcome.auto_resolved = true;
        Ok(())
    }

    fn decay_support_edges(&self, source_id: &str, delta: f64) -> VerityResult<()> {
        let edges = self.store.outgoing_edges(source_id, EdgeTypeFilter::default())?;
        for mut edge in edges {
            if edge.edge_type.is_support() {
                edge.strength *= 1.0 - delta;
                self.store.delete_edge(&edge.source_id, &edge.target_id, edge.edge_type)?;
                self.store.insert_edge(&edge)?;
            }
        }
        Ok(())
    }

    fn recover_support_edges(&self, source_id: &str) -> VerityResult<()> {
        let edges = self.store.outgoing_edges(source_id, EdgeTypeFilter::default())?;
        for mut edge in edges {
            if edge.edge_type.is_support() {
                edge.strength = (edge.strength * RECOVERY_MULTIPLIER).min(1.0);
                self.store.delete_edge(&edge.source_id, &edge.target_id, edge.edge_type)?;
                self.store.insert_edge(&edge)?;
            }
        }
        Ok(())
    }

    fn apply_shock(&self, shock: &verity_core::traits::ShockResult) -> VerityResult<()> {
        for (memory_id, delta) in &shock.updates {
            let Some(mut memory) = self.store.get_memory(memory_id)? else { continue };
            let current = memory.effective_confidence();
            memory.propagated_confidence = Some(verity_core::memory::Confidence::new(current + delta));
            memory.updated_at = Utc::now();
            self.store.update_memory(&memory)?;
        }
        Ok(())
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    (dot / (norm_a * norm_b)) as f64
}

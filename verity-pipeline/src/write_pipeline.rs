//! C3 — the observe/assume/update ingestion pipeline.
//!
//! Mirrors the transactional-then-background-retriable shape of
//! `cortex-storage`'s `memory_crud::insert_memory` (row write is atomic;
//! everything after it is allowed to fail and be retried by a sweeper).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use verity_core::constants::{
    DEFAULT_STARTING_CONFIDENCE, THESIS_CHANGE_ASSUME_THRESHOLD, THESIS_CHANGE_REVIEW_THRESHOLD,
};
use verity_core::errors::{VerityError, VerityResult};
use verity_core::memory::{Confidence, Edge, EdgeType, ExposureStatus, Memory, MemoryState, Origin};
use verity_core::models::{ChangeType, VersionSnapshot};
use verity_core::traits::{ConditionEmbedding, EntityStore, ExposureJob, ExposureQueue, ThesisArbiter, ThesisVerdict};

use verity_index::named_indexes::ConditionIndexes;

use crate::validation::validate_observe_request;

/// Upstream request shape for both `observe` (source set) and `assume`
/// (derived_from set) — the spec distinguishes the two only by which origin
/// field is populated, not by a separate commit sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserveRequest {
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub derived_from: Option<Vec<String>>,
    #[serde(default)]
    pub invalidates_if: Vec<String>,
    #[serde(default)]
    pub confirms_if: Vec<String>,
    #[serde(default)]
    pub assumes: Vec<String>,
    #[serde(default)]
    pub resolves_by: Option<DateTime<Utc>>,
    #[serde(default)]
    pub outcome_condition: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserveOutcome {
    pub id: String,
    pub status: MemoryState,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub memory_id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub invalidates_if: Option<Vec<String>>,
    #[serde(default)]
    pub confirms_if: Option<Vec<String>>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

pub struct WritePipeline {
    store: Arc<dyn EntityStore>,
    indexes: Arc<ConditionIndexes>,
    arbiter: Arc<dyn ThesisArbiter>,
    queue: Arc<dyn ExposureQueue>,
}

impl WritePipeline {
    pub fn new(
        store: Arc<dyn EntityStore>,
        indexes: Arc<ConditionIndexes>,
        arbiter: Arc<dyn ThesisArbiter>,
        queue: Arc<dyn ExposureQueue>,
    ) -> Self {
        Self { store, indexes, arbiter, queue }
    }

    /// Runs the full commit sequence (spec §4.3 steps 1-7). Steps 1-4 are
    /// atomic at row level via the store; steps 5-7 are allowed to fail,
    /// leaving the row `pending` for [`Self::retry_pending`] to pick up.
    pub async fn observe(&self, req: ObserveRequest) -> VerityResult<ObserveOutcome> {
        validate_observe_request(&req, self.store.as_ref())?;

        let id = Uuid::new_v4().to_string();
        let starting_confidence = self.starting_confidence(&req)?;
        let (state, warnings) = self.completeness_challenge(&req);

        let origin = match (&req.source, &req.derived_from) {
            (Some(source), _) => Origin::Observation { source: source.clone() },
            (None, Some(parents)) => Origin::Thought { derived_from: parents.clone() },
            (None, None) => unreachable!("validated above"),
        };

        let now = Utc::now();
        let memory = Memory {
            id: id.clone(),
            content: req.content.clone(),
            origin,
            resolves_by: req.resolves_by,
            outcome_condition: req.outcome_condition.clone(),
            assumes: req.assumes.clone(),
            invalidates_if: req.invalidates_if.clone(),
            confirms_if: req.confirms_if.clone(),
            tags: req.tags.clone(),
            starting_confidence: Confidence::new(starting_confidence),
            confirmations: 0,
            times_tested: 0,
            contradictions: 0,
            centrality: 0,
            propagated_confidence: None,
            created_at: now,
            updated_at: now,
            state,
            retracted: false,
            retracted_at: None,
            retraction_reason: None,
            violations: vec![],
            resolution_outcome: None,
            resolved_at: None,
            exposure_status: ExposureStatus::Pending,
            content_hash: Memory::compute_content_hash(&req.content),
            agent_id: req.agent_id.clone(),
        };

        // Step 2: write the row.
        self.store.insert_memory(&memory)?;

        // Step 3: derivation edges + parent centrality.
        if let Some(parents) = &req.derived_from {
            for parent_id in parents {
                self.store.insert_edge(&Edge::new(parent_id.clone(), id.clone(), EdgeType::DerivedFrom))?;
                self.bump_centrality(parent_id)?;
            }
        }

        // Step 4: created version snapshot.
        self.store.insert_version(&VersionSnapshot {
            entity_id: id.clone(),
            version_number: 1,
            change_type: ChangeType::Created,
            content_snapshot: serde_json::to_value(&memory).map_err(VerityError::Serialization)?,
            change_reason: None,
            session_id: req.session_id.clone(),
            request_id: None,
            created_at: now,
        })?;

        if state == MemoryState::Draft {
            return Ok(ObserveOutcome { id, status: state, warnings });
        }

        self.embed_and_enqueue(&memory, req.session_id.clone(), None).await?;

        Ok(ObserveOutcome { id, status: MemoryState::Active, warnings })
    }

    /// Steps 5-7, split out so the background sweeper can retry a `pending`
    /// row (found via `find_pending_exposure`) without re-running 1-4, and so
    /// `promote` (draft -> active) can run them for the first time.
    pub async fn embed_and_enqueue(
        &self,
        memory: &Memory,
        session_id: Option<String>,
        request_id: Option<String>,
    ) -> VerityResult<()> {
        let indexes = self.indexes.clone();
        let content = memory.content.clone();
        let content_hash = memory.content_hash.clone();
        let invalidates = memory.invalidates_if.clone();
        let confirms = memory.confirms_if.clone();

        let (content_vector, invalidates_vectors, confirms_vectors) =
            tokio::task::spawn_blocking(move || -> VerityResult<_> {
                let content_vector = indexes.embed_cached(&content_hash, &content)?;
                let invalidates_vectors: VerityResult<Vec<Vec<f32>>> =
                    invalidates.iter().map(|c| indexes.embedder().embed(c)).collect();
                let confirms_vectors: VerityResult<Vec<Vec<f32>>> =
                    confirms.iter().map(|c| indexes.embedder().embed(c)).collect();
                Ok((content_vector, invalidates_vectors?, confirms_vectors?))
            })
            .await
            .map_err(|e| VerityError::internal("join_error", e.to_string()))??;

        // Step 6: upsert into the three named indexes.
        let time_bound = memory.is_time_bound();
        self.indexes.upsert_content(
            &memory.id,
            &content_vector,
            json!({
                "type": if memory.is_observation() { "observation" } else { "thought" },
                "source": memory.origin.source(),
                "has_invalidates_if": !memory.invalidates_if.is_empty(),
                "has_confirms_if": !memory.confirms_if.is_empty(),
                "has_assumes": !memory.assumes.is_empty(),
                "resolves_by": memory.resolves_by,
                "time_bound": time_bound,
            }),
        )?;

        let mut invalidates_conditions = Vec::with_capacity(memory.invalidates_if.len());
        for (i, (text, vector)) in memory.invalidates_if.iter().zip(&invalidates_vectors).enumerate() {
            self.indexes.upsert_invalidates(
                &memory.id,
                i,
                vector,
                json!({"memory_id": memory.id, "condition_index": i, "condition_text": text, "time_bound": time_bound}),
            )?;
            invalidates_conditions.push(ConditionEmbedding { index: i, text: text.clone(), embedding: vector.clone() });
        }

        let mut confirms_conditions = Vec::with_capacity(memory.confirms_if.len());
        for (i, (text, vector)) in memory.confirms_if.iter().zip(&confirms_vectors).enumerate() {
            self.indexes.upsert_confirms(
                &memory.id,
                i,
                vector,
                json!({"memory_id": memory.id, "condition_index": i, "condition_text": text, "time_bound": time_bound}),
            )?;
            confirms_conditions.push(ConditionEmbedding { index: i, text: text.clone(), embedding: vector.clone() });
        }

        // Row is now embedded; flip exposure_status before enqueueing so a
        // crash between here and the enqueue still finds a row a sweeper can
        // re-embed (idempotent: re-embedding the same content is a no-op
        // upsert) rather than one stuck invisible to both paths.
        let mut updated = memory.clone();
        updated.exposure_status = ExposureStatus::Ready;
        updated.updated_at = Utc::now();
        self.store.update_memory(&updated)?;

        // Step 7: enqueue the exposure-check job.
        self.queue.enqueue(ExposureJob {
            memory_id: memory.id.clone(),
            content: memory.content.clone(),
            embedding: content_vector,
            invalidates_conditions,
            confirms_conditions,
            time_bound,
            session_id,
            request_id,
            enqueued_at: Utc::now(),
        })?;

        Ok(())
    }

    /// Explicit `draft -> active` promotion (resolved Open Question (b)):
    /// runs the embed-and-enqueue steps that were skipped at draft time.
    pub async fn promote(&self, memory_id: &str) -> VerityResult<()> {
        let mut memory = self
            .store
            .get_memory(memory_id)?
            .ok_or_else(|| VerityError::not_found(memory_id))?;
        if memory.state != MemoryState::Draft {
            return Err(VerityError::validation(format!("{memory_id} is not in draft state")));
        }
        memory.state = MemoryState::Active;
        memory.updated_at = Utc::now();
        self.store.update_memory(&memory)?;
        self.embed_and_enqueue(&memory, None, None).await
    }

    /// Thesis-change guard + content/field update (spec §4.3 updates-only
    /// paragraph). Non-content field updates skip the guard entirely.
    pub async fn update(&self, req: UpdateRequest) -> VerityResult<()> {
        let mut memory = self
            .store
            .get_memory(&req.memory_id)?
            .ok_or_else(|| VerityError::not_found(&req.memory_id))?;

        if let Some(new_content) = &req.content {
            self.guard_thesis_change(&memory.content, new_content).await?;
            memory.content = new_content.clone();
            memory.content_hash = Memory::compute_content_hash(new_content);
        }
        if let Some(tags) = req.tags {
            memory.tags = tags;
        }
        if let Some(invalidates_if) = req.invalidates_if {
            memory.invalidates_if = invalidates_if;
        }
        if let Some(confirms_if) = req.confirms_if {
            memory.confirms_if = confirms_if;
        }
        memory.updated_at = Utc::now();

        self.store.update_memory(&memory)?;

        if req.content.is_some() {
            self.embed_and_enqueue(&memory, req.session_id, req.request_id).await?;
        }
        Ok(())
    }

    async fn guard_thesis_change(&self, old_content: &str, new_content: &str) -> VerityResult<()> {
        let indexes = self.indexes.clone();
        let old = old_content.to_string();
        let new = new_content.to_string();
        let similarity = tokio::task::spawn_blocking(move || -> VerityResult<f64> {
            let old_vec = indexes.embedder().embed(&old)?;
            let new_vec = indexes.embedder().embed(&new)?;
            Ok(cosine(&old_vec, &new_vec))
        })
        .await
        .map_err(|e| VerityError::internal("join_error", e.to_string()))??;

        if similarity >= THESIS_CHANGE_REVIEW_THRESHOLD {
            return Ok(());
        }

        let arbiter = self.arbiter.clone();
        let old = old_content.to_string();
        let new = new_content.to_string();
        let verdict = tokio::task::spawn_blocking(move || arbiter.judge(&old, &new))
            .await
            .map_err(|e| VerityError::internal("join_error", e.to_string()))?;

        let changed_thesis = match verdict {
            Ok(ThesisVerdict::ChangedThesis) => true,
            Ok(ThesisVerdict::SameThesis) => false,
            Err(_) if similarity < THESIS_CHANGE_ASSUME_THRESHOLD => true,
            Err(e) => return Err(e),
        };

        if changed_thesis {
            return Err(VerityError::semantic_guard(
                "content update changes the memory's thesis",
                Some("resolve + observe".to_string()),
            ));
        }
        Ok(())
    }

    fn starting_confidence(&self, req: &ObserveRequest) -> VerityResult<f64> {
        if let Some(source) = &req.source {
            if let Some(learned) = self.store.get_stat(&format!("source:{source}:learned_confidence"))? {
                return Ok(learned);
            }
        }
        Ok(DEFAULT_STARTING_CONFIDENCE)
    }

    /// Deterministic stand-in for the spec's optional LLM completeness check:
    /// a claim with no falsifiability condition and no resolution deadline
    /// can never be tested, so it is held back as `draft`.
    fn completeness_challenge(&self, req: &ObserveRequest) -> (MemoryState, Vec<String>) {
        let falsifiable = !req.invalidates_if.is_empty() || !req.confirms_if.is_empty() || req.resolves_by.is_some();
        if falsifiable {
            (MemoryState::Active, vec![])
        } else {
            (
                MemoryState::Draft,
                vec!["no invalidates_if, confirms_if, or resolves_by: this claim cannot be tested".to_string()],
            )
        }
    }

    fn bump_centrality(&self, parent_id: &str) -> VerityResult<()> {
        let mut parent = self
            .store
            .get_memory(parent_id)?
            .ok_or_else(|| VerityError::validation(format!("derived_from parent not found: {parent_id}")))?;
        parent.centrality += 1;
        parent.updated_at = Utc::now();
        self.store.update_memory(&parent)
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

//! Query-path and single-id write operations that sit directly on
//! [`VerityRuntime`] rather than inside one of the C3/C4/C9 crates: `assume`
//! thinly wraps [`verity_pipeline::WritePipeline::observe`], `confirm`/
//! `violate`/`retract` are the explicit single-id counterparts to C4's
//! automatic condition-match detection (`exposure_checker.rs`), and the
//! read-side operations (`find`, `recall`, `reference`, `between`, `roots`,
//! `brittle`, `collisions`, `stats`, `history`, `access_log`) serve the
//! representative `GET` surface.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use verity_core::constants::{CORE_DECAY_FACTOR, CORE_SHOCK_MAGNITUDE, PERIPHERAL_DECAY_FACTOR, RECOVERY_MULTIPLIER};
use verity_core::errors::{VerityError, VerityResult};
use verity_core::memory::{DamageLevel, Edge, EdgeType, EdgeTypeFilter, Memory, MemoryState, ResolutionOutcome, Violation};
use verity_core::models::{AccessEvent, AccessType, EventType, MemoryEvent, Notification, NotificationType, VersionSnapshot};
use verity_core::traits::EntityStore;
use verity_resolution::ResolutionSummary;
use verity_zones::ZoneReport;

use crate::runtime::VerityRuntime;

/// `up` toward parents/roots, `down` toward dependents, `both` either way —
/// the `direction=` query param on `GET /reference/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceDirection {
    Up,
    Down,
    Both,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindRequest {
    pub query: String,
    pub limit: usize,
    pub min_similarity: f64,
    pub include_retracted: bool,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindHit {
    pub id: String,
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub max_times_tested: f64,
    pub median_times_tested: f64,
    pub sampled_memories: usize,
    pub active: usize,
    pub draft: usize,
    pub confirmed: usize,
    pub violated: usize,
    pub expired: usize,
    pub resolved: usize,
    pub retracted: usize,
}

impl VerityRuntime {
    /// `POST /assume` — identical commit sequence to `observe`, distinguished
    /// only by the request populating `derived_from` rather than `source`.
    pub async fn assume(&self, req: verity_pipeline::ObserveRequest) -> VerityResult<verity_pipeline::ObserveOutcome> {
        self.pipeline.observe(req).await
    }

    /// `POST /confirm/:id` — the single-id counterpart to C4's condition-match
    /// confirmation: bumps the counters, recovers outgoing support edges, and
    /// emits the same `Confirmation` event C4 emits on an automatic match.
    pub fn confirm(&self, memory_id: &str) -> VerityResult<()> {
        let mut memory = self.get_required(memory_id)?;
        if memory.retracted {
            return Err(VerityError::validation(format!("{memory_id} is retracted")));
        }

        memory.confirmations += 1;
        memory.times_tested += 1;
        if memory.state == MemoryState::Active {
            memory.state = MemoryState::Confirmed;
        }
        memory.updated_at = Utc::now();
        self.store.update_memory(&memory)?;

        recover_support_edges(self.store.as_ref(), memory_id)?;

        self.store.enqueue_event(&MemoryEvent {
            id: Uuid::new_v4().to_string(),
            session_id: "unscoped".to_string(),
            event_type: EventType::Confirmation,
            memory_id: memory_id.to_string(),
            violated_by: None,
            damage_level: None,
            context: serde_json::json!({"manual": true}),
            created_at: Utc::now(),
            dispatched: false,
            dispatched_at: None,
            workflow_id: None,
        })
    }

    /// `POST /violate/:id` — the single-id counterpart to C4's condition-match
    /// violation: appends a violation record, decays outgoing support edges,
    /// and triggers a core shock cascade when the target is core.
    pub fn violate(&self, memory_id: &str) -> VerityResult<()> {
        let mut memory = self.get_required(memory_id)?;
        if memory.retracted {
            return Err(VerityError::validation(format!("{memory_id} is retracted")));
        }

        let damage_level = memory.damage_level();
        memory.violations.push(Violation {
            condition: "manual violation".to_string(),
            observed_at: Utc::now(),
            observation_id: None,
            damage_level,
        });
        memory.contradictions += 1;
        memory.times_tested += 1;
        memory.state = MemoryState::Violated;
        memory.updated_at = Utc::now();
        self.store.update_memory(&memory)?;

        let delta = match damage_level {
            DamageLevel::Core => CORE_DECAY_FACTOR,
            DamageLevel::Peripheral => PERIPHERAL_DECAY_FACTOR,
        };
        decay_support_edges(self.store.as_ref(), memory_id, delta)?;

        if damage_level == DamageLevel::Core {
            let shock = self.shock.propagate(memory_id, CORE_SHOCK_MAGNITUDE)?;
            apply_shock(self.store.as_ref(), &shock)?;

            self.store.insert_notification(&Notification {
                id: Uuid::new_v4().to_string(),
                notification_type: NotificationType::CoreViolation,
                memory_id: memory_id.to_string(),
                content: format!("core memory {memory_id} manually violated"),
                context: serde_json::json!({}),
                read: false,
                created_at: Utc::now(),
            })?;

            self.store.enqueue_event(&MemoryEvent {
                id: Uuid::new_v4().to_string(),
                session_id: "unscoped".to_string(),
                event_type: EventType::CoreViolation,
                memory_id: memory_id.to_string(),
                violated_by: None,
                damage_level: Some(damage_level),
                context: serde_json::json!({"manual": true}),
                created_at: Utc::now(),
                dispatched: false,
                dispatched_at: None,
                workflow_id: None,
            })
        } else {
            self.store.enqueue_event(&MemoryEvent {
                id: Uuid::new_v4().to_string(),
                session_id: "unscoped".to_string(),
                event_type: EventType::Violation,
                memory_id: memory_id.to_string(),
                violated_by: None,
                damage_level: Some(damage_level),
                context: serde_json::json!({"manual": true}),
                created_at: Utc::now(),
                dispatched: false,
                dispatched_at: None,
                workflow_id: None,
            })
        }
    }

    /// `POST /retract/:id` — idempotent tombstone. A thought's parents lose a
    /// dependent, matching the glossary's "centrality decrements on retraction".
    pub fn retract(&self, memory_id: &str, reason: Option<String>) -> VerityResult<()> {
        let mut memory = self.get_required(memory_id)?;
        if memory.retracted {
            return Ok(());
        }

        for parent_id in memory.origin.derived_from().to_vec() {
            if let Some(mut parent) = self.store.get_memory(&parent_id)? {
                parent.centrality = parent.centrality.saturating_sub(1);
                parent.updated_at = Utc::now();
                self.store.update_memory(&parent)?;
            }
        }

        memory.retracted = true;
        memory.retracted_at = Some(Utc::now());
        memory.retraction_reason = reason;
        memory.updated_at = Utc::now();
        self.store.update_memory(&memory)
    }

    /// `POST /resolve/:id` — thin wrapper over the resolution cascade, kept
    /// here alongside `confirm`/`violate`/`retract` so the facade exposes one
    /// method per single-id operation rather than a mix of wrappers and a
    /// public `resolver` field.
    pub fn resolve(&self, memory_id: &str, outcome: ResolutionOutcome) -> VerityResult<ResolutionSummary> {
        self.resolver.resolve(memory_id, outcome)
    }

    /// `POST /find` — semantic search over the content index.
    pub fn find(&self, req: &FindRequest) -> VerityResult<Vec<FindHit>> {
        let vector = self.indexes.embedder().embed(&req.query)?;
        let hits = self.indexes.query_content(&vector, req.limit, req.min_similarity)?;

        let mut results = Vec::with_capacity(hits.len());
        for (rank, (id, similarity, _metadata)) in hits.into_iter().enumerate() {
            let Some(memory) = self.store.get_memory(&id)? else { continue };
            if memory.retracted && !req.include_retracted {
                continue;
            }
            self.store.record_access(&AccessEvent {
                entity_id: id.clone(),
                access_type: AccessType::Find,
                session_id: req.session_id.clone(),
                query_text: Some(req.query.clone()),
                result_rank: Some(rank as u32),
                similarity: Some(similarity),
                created_at: Utc::now(),
            })?;
            results.push(FindHit { id, similarity });
        }
        Ok(results)
    }

    /// `GET /recall/:id`
    pub fn recall(&self, memory_id: &str, session_id: Option<&str>) -> VerityResult<Option<Memory>> {
        let memory = self.store.get_memory(memory_id)?;
        if memory.is_some() {
            self.store.record_access(&AccessEvent {
                entity_id: memory_id.to_string(),
                access_type: AccessType::Recall,
                session_id: session_id.map(|s| s.to_string()),
                query_text: None,
                result_rank: None,
                similarity: None,
                created_at: Utc::now(),
            })?;
        }
        Ok(memory)
    }

    /// `GET /reference/:id?depth=&direction=` — BFS over `derived_from` edges
    /// only, up/down/both, bounded by `depth`.
    pub fn reference(&self, memory_id: &str, depth: usize, direction: ReferenceDirection) -> VerityResult<Vec<String>> {
        let mut visited = HashSet::from([memory_id.to_string()]);
        let mut frontier = VecDeque::from([(memory_id.to_string(), 0usize)]);
        let mut reached = Vec::new();

        while let Some((id, d)) = frontier.pop_front() {
            if d >= depth {
                continue;
            }
            let filter = EdgeTypeFilter(Some(EdgeType::DerivedFrom));
            let mut neighbors = Vec::new();
            if matches!(direction, ReferenceDirection::Up | ReferenceDirection::Both) {
                // derived_from edges point parent -> child; ancestors are sources of incoming edges.
                neighbors.extend(self.store.incoming_edges(&id, filter)?.into_iter().map(|e| e.source_id));
            }
            if matches!(direction, ReferenceDirection::Down | ReferenceDirection::Both) {
                neighbors.extend(self.store.outgoing_edges(&id, filter)?.into_iter().map(|e| e.target_id));
            }
            for next in neighbors {
                if visited.insert(next.clone()) {
                    reached.push(next.clone());
                    frontier.push_back((next, d + 1));
                }
            }
        }

        self.store.record_access(&AccessEvent {
            entity_id: memory_id.to_string(),
            access_type: AccessType::Reference,
            session_id: None,
            query_text: None,
            result_rank: None,
            similarity: None,
            created_at: Utc::now(),
        })?;
        Ok(reached)
    }

    /// `GET /between?ids=a,b,...` — every signed edge with both endpoints in
    /// the given id set.
    pub fn between(&self, ids: &[String], limit: usize) -> VerityResult<Vec<Edge>> {
        let set: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
        let mut edges = Vec::new();
        for id in ids {
            for edge in self.store.outgoing_edges(id, EdgeTypeFilter::default())? {
                if set.contains(edge.target_id.as_str()) {
                    edges.push(edge);
                    if edges.len() >= limit {
                        return Ok(edges);
                    }
                }
            }
        }
        Ok(edges)
    }

    /// `GET /roots/:id` — walk `derived_from` ancestry to every memory with no
    /// further parents.
    pub fn roots(&self, memory_id: &str) -> VerityResult<Vec<String>> {
        let mut visited = HashSet::from([memory_id.to_string()]);
        let mut frontier = VecDeque::from([memory_id.to_string()]);
        let mut roots = Vec::new();

        while let Some(id) = frontier.pop_front() {
            let parents = self.store.incoming_edges(&id, EdgeTypeFilter(Some(EdgeType::DerivedFrom)))?;
            if parents.is_empty() {
                roots.push(id);
                continue;
            }
            for edge in parents {
                if visited.insert(edge.source_id.clone()) {
                    frontier.push_back(edge.source_id);
                }
            }
        }
        Ok(roots)
    }

    /// `GET /brittle?max_times_tested=&min_confidence=` — thinly tested,
    /// weakly held claims, sampled from the most recently touched memories.
    pub fn brittle(&self, max_times_tested: u32, min_confidence: f64, limit: usize) -> VerityResult<Vec<Memory>> {
        let sample = self.store.scan_memories(limit.saturating_mul(20).max(1000))?;
        Ok(sample
            .into_iter()
            .filter(|m| !m.retracted && m.times_tested <= max_times_tested && m.effective_confidence() <= min_confidence)
            .take(limit)
            .collect())
    }

    /// `GET /collisions` — active, unresolved contradiction edges.
    pub fn collisions(&self, limit: usize) -> VerityResult<Vec<Edge>> {
        let mut edges = Vec::new();
        for edge in self.store.all_signed_edges()? {
            if edge.edge_type != EdgeType::ViolatedBy {
                continue;
            }
            let Some(target) = self.store.get_memory(&edge.target_id)? else { continue };
            let Some(source) = self.store.get_memory(&edge.source_id)? else { continue };
            if source.retracted || target.retracted {
                continue;
            }
            edges.push(edge);
            if edges.len() >= limit {
                break;
            }
        }
        Ok(edges)
    }

    /// `GET /stats` — global evidence-weight bookkeeping plus a state-tally
    /// sample (the store has no bulk count primitive beyond a bounded scan).
    pub fn stats(&self) -> VerityResult<StatsSnapshot> {
        let max_times_tested = self.store.get_stat("max_times_tested")?.unwrap_or(verity_core::constants::DEFAULT_MAX_TIMES_TESTED);
        let median_times_tested = self.store.get_stat("median_times_tested")?.unwrap_or(0.0);

        let sample = self.store.scan_memories(10_000)?;
        let mut snapshot = StatsSnapshot {
            max_times_tested,
            median_times_tested,
            sampled_memories: sample.len(),
            active: 0,
            draft: 0,
            confirmed: 0,
            violated: 0,
            expired: 0,
            resolved: 0,
            retracted: 0,
        };
        for memory in &sample {
            if memory.retracted {
                snapshot.retracted += 1;
            }
            match memory.state {
                MemoryState::Active => snapshot.active += 1,
                MemoryState::Draft => snapshot.draft += 1,
                MemoryState::Confirmed => snapshot.confirmed += 1,
                MemoryState::Violated => snapshot.violated += 1,
                MemoryState::Expired => snapshot.expired += 1,
                MemoryState::Resolved => snapshot.resolved += 1,
            }
        }
        Ok(snapshot)
    }

    /// `GET /history/:id[/version/:n]`
    pub fn history(&self, memory_id: &str, version: Option<u32>) -> VerityResult<Vec<VersionSnapshot>> {
        let snapshots = self.store.history(memory_id)?;
        Ok(match version {
            Some(n) => snapshots.into_iter().filter(|s| s.version_number == n).collect(),
            None => snapshots,
        })
    }

    /// `GET /access-log/:id`
    pub fn access_log(&self, memory_id: &str, limit: usize) -> VerityResult<Vec<AccessEvent>> {
        self.store.access_log(memory_id, limit)
    }

    /// `GET /zone/:id?query=`
    pub fn zone(&self, memory_id: &str, query: Option<&str>, depth: Option<usize>, top_k: Option<usize>) -> VerityResult<ZoneReport> {
        let report = self.zones.build(memory_id, query, depth, top_k)?;
        self.store.record_access(&AccessEvent {
            entity_id: memory_id.to_string(),
            access_type: AccessType::Zone,
            session_id: None,
            query_text: query.map(|q| q.to_string()),
            result_rank: None,
            similarity: None,
            created_at: Utc::now(),
        })?;
        Ok(report)
    }

    fn get_required(&self, memory_id: &str) -> VerityResult<Memory> {
        self.store.get_memory(memory_id)?.ok_or_else(|| VerityError::not_found(memory_id))
    }
}

fn recover_support_edges(store: &dyn EntityStore, source_id: &str) -> VerityResult<()> {
    for mut edge in store.outgoing_edges(source_id, EdgeTypeFilter::default())? {
        if edge.edge_type.is_support() {
            edge.strength = (edge.strength * RECOVERY_MULTIPLIER).min(1.0);
            store.delete_edge(&edge.source_id, &edge.target_id, edge.edge_type)?;
            store.insert_edge(&edge)?;
        }
    }
    Ok(())
}

fn decay_support_edges(store: &dyn EntityStore, source_id: &str, delta: f64) -> VerityResult<()> {
    for mut edge in store.outgoing_edges(source_id, EdgeTypeFilter::default())? {
        if edge.edge_type.is_support() {
            edge.strength *= 1.0 - delta;
            store.delete_edge(&edge.source_id, &edge.target_id, edge.edge_type)?;
            store.insert_edge(&edge)?;
        }
    }
    Ok(())
}

fn apply_shock(store: &dyn EntityStore, shock: &verity_core::traits::ShockResult) -> VerityResult<()> {
    for (memory_id, delta) in &shock.updates {
        let Some(mut memory) = store.get_memory(memory_id)? else { continue };
        let current = memory.effective_confidence();
        memory.propagated_confidence = Some(verity_core::memory::Confidence::new(current + delta));
        memory.updated_at = Utc::now();
        store.update_memory(&memory)?;
    }
    Ok(())
}

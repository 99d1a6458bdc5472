use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::confidence::Confidence;

/// A memory's origin, derived purely from field presence (resolved Open
/// Question (a)): a `source` label makes it an observation; a non-empty
/// `derived_from` list makes it a thought. Exactly one is ever populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Observation { source: String },
    Thought { derived_from: Vec<String> },
}

impl Origin {
    pub fn is_observation(&self) -> bool {
        matches!(self, Origin::Observation { .. })
    }

    pub fn source(&self) -> Option<&str> {
        match self {
            Origin::Observation { source } => Some(source.as_str()),
            Origin::Thought { .. } => None,
        }
    }

    pub fn derived_from(&self) -> &[String] {
        match self {
            Origin::Thought { derived_from } => derived_from.as_slice(),
            Origin::Observation { .. } => &[],
        }
    }
}

/// `core` if the target's centrality is >= the core threshold, else `peripheral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageLevel {
    Core,
    Peripheral,
}

impl DamageLevel {
    pub fn from_centrality(centrality: u32) -> Self {
        if centrality >= crate::constants::CORE_CENTRALITY_THRESHOLD {
            DamageLevel::Core
        } else {
            DamageLevel::Peripheral
        }
    }
}

/// An append-only record of a condition match against this memory's
/// `invalidates_if` (a violation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub condition: String,
    pub observed_at: DateTime<Utc>,
    pub observation_id: Option<String>,
    pub damage_level: DamageLevel,
}

/// State machine: `active`/`draft` are the only states a new memory can start
/// in; the rest are reached via C4/C9/resolution per the spec's lifecycle note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryState {
    Active,
    Draft,
    Confirmed,
    Violated,
    Expired,
    Resolved,
}

/// Outcome recorded when a time-bound memory (prediction) resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Correct,
    Incorrect,
    Void,
}

/// The universal node of the belief graph: a claim with content, origin, and
/// confidence accounting. See spec §3 for the full invariant list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    pub origin: Origin,

    pub resolves_by: Option<DateTime<Utc>>,
    pub outcome_condition: Option<String>,

    pub assumes: Vec<String>,
    pub invalidates_if: Vec<String>,
    pub confirms_if: Vec<String>,
    pub tags: Vec<String>,

    pub starting_confidence: Confidence,
    pub confirmations: u32,
    pub times_tested: u32,
    pub contradictions: u32,
    pub centrality: u32,
    pub propagated_confidence: Option<Confidence>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub state: MemoryState,
    pub retracted: bool,
    pub retracted_at: Option<DateTime<Utc>>,
    pub retraction_reason: Option<String>,

    pub violations: Vec<Violation>,

    pub resolution_outcome: Option<ResolutionOutcome>,
    pub resolved_at: Option<DateTime<Utc>>,

    /// Row-exposure status: whether steps 5-7 of the write pipeline (embed,
    /// vector upsert, exposure-job enqueue) have completed. A row stuck at
    /// `pending` past the retry window is picked up by the background sweeper.
    pub exposure_status: ExposureStatus,

    /// blake3 content hash, used for thesis-change comparison bookkeeping and
    /// as a dedup key for the embedding cache.
    pub content_hash: String,

    /// Opaque agent scope tag (the spec's only multi-tenancy concept).
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureStatus {
    Pending,
    Ready,
}

impl Memory {
    pub fn is_time_bound(&self) -> bool {
        self.resolves_by.is_some()
    }

    pub fn is_observation(&self) -> bool {
        self.origin.is_observation()
    }

    pub fn earned_ratio(&self) -> Option<f64> {
        if self.times_tested == 0 {
            None
        } else {
            Some(self.confirmations as f64 / self.times_tested as f64)
        }
    }

    /// Mean-confidence fallback chain used by the zone builder (§4.7 step 6):
    /// propagated confidence, else earned ratio, else starting confidence.
    pub fn effective_confidence(&self) -> f64 {
        self.propagated_confidence
            .map(|c| c.value())
            .or_else(|| self.earned_ratio())
            .unwrap_or(self.starting_confidence.value())
    }

    pub fn damage_level(&self) -> DamageLevel {
        DamageLevel::from_centrality(self.centrality)
    }

    pub fn compute_content_hash(content: &str) -> String {
        blake3::hash(content.as_bytes()).to_hex().to_string()
    }
}

impl PartialEq for Memory {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

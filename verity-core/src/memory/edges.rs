use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four edge types. `derived_from` and `confirmed_by` are support
/// (positive sign); `violated_by` is contradiction (negative sign);
/// `supersedes` carries no sign and is excluded from the signed-graph view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    DerivedFrom,
    ConfirmedBy,
    ViolatedBy,
    Supersedes,
}

impl EdgeType {
    /// Sign in the signed graph: `+1` support, `-1` contradiction, `None` for
    /// edge types that don't participate in balance/propagation math.
    pub fn sign(self) -> Option<i8> {
        match self {
            EdgeType::DerivedFrom | EdgeType::ConfirmedBy => Some(1),
            EdgeType::ViolatedBy => Some(-1),
            EdgeType::Supersedes => None,
        }
    }

    pub fn is_support(self) -> bool {
        matches!(self, EdgeType::DerivedFrom | EdgeType::ConfirmedBy)
    }

    pub fn is_contradiction(self) -> bool {
        matches!(self, EdgeType::ViolatedBy)
    }
}

/// A directed, typed, strength-weighted edge between two memories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub edge_type: EdgeType,
    pub strength: f64,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            edge_type,
            strength: 1.0,
            created_at: Utc::now(),
        }
    }
}

/// A frontier edge-type filter used by batched edge lookups (§4.1).
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTypeFilter(pub Option<EdgeType>);

impl EdgeTypeFilter {
    pub fn matches(self, edge_type: EdgeType) -> bool {
        match self.0 {
            None => true,
            Some(t) => t == edge_type,
        }
    }
}

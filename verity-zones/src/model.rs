//! Zone report types returned by the `zone` query.

use serde::{Deserialize, Serialize};

use verity_core::memory::EdgeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    A,
    B,
}

impl Color {
    pub fn flip(self) -> Self {
        match self {
            Color::A => Color::B,
            Color::B => Color::A,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneMember {
    pub id: String,
    pub color: Color,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEdge {
    pub source_id: String,
    pub target_id: String,
    pub edge_type: EdgeType,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryReason {
    /// A contradiction edge crossing the zone boundary.
    CutMinus,
    /// A support edge entering the zone from outside it.
    LossPlus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryEdge {
    pub source_id: String,
    pub target_id: String,
    pub edge_type: EdgeType,
    pub strength: f64,
    pub reason: BoundaryReason,
}

/// A same-color pair joined by a contradiction edge, or an opposite-color
/// pair joined by a support edge: the coloring couldn't satisfy both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColoringConflict {
    pub source_id: String,
    pub target_id: String,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneReport {
    pub seed: String,
    pub members: Vec<ZoneMember>,
    pub internal_edges: Vec<ZoneEdge>,
    pub boundary: Vec<BoundaryEdge>,
    pub cut_minus: usize,
    pub loss_plus: usize,
    pub safe: bool,
    pub conflicts: Vec<ColoringConflict>,
    pub score: f64,
}

pub mod base;
pub mod confidence;
pub mod edges;

pub use base::{DamageLevel, ExposureStatus, Memory, MemoryState, Origin, ResolutionOutcome, Violation};
pub use confidence::{clamp01, Confidence};
pub use edges::{Edge, EdgeType, EdgeTypeFilter};

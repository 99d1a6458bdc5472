//! # verity-zones
//!
//! Structurally balanced reasoning zones (C7): around a query seed, assemble
//! the consistent neighborhood via Harary 2-coloring and report its boundary
//! and quality score.

pub mod builder;
pub mod model;

pub use builder::ZoneBuilder;
pub use model::{BoundaryEdge, BoundaryReason, Color, ColoringConflict, ZoneEdge, ZoneMember, ZoneReport};

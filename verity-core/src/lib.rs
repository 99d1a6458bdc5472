//! # verity-core
//!
//! Foundation crate for the belief-graph engine. Defines the memory/edge data
//! model, the error taxonomy, configuration, constants, and the traits that
//! every other crate in the workspace programs against.

pub mod config;
pub mod constants;
pub mod errors;
pub mod memory;
pub mod models;
pub mod traits;

pub use config::VerityConfig;
pub use errors::{VerityError, VerityResult};
pub use memory::{Confidence, DamageLevel, Edge, EdgeType, Memory, MemoryState, Origin, Violation};
pub use traits::{
    ConditionEmbedding, Embedder, EntityStore, EventDispatcher, ExposureJob, ExposureQueue, IndexStore,
    ShockPropagator, ShockResult, ThesisArbiter, ThesisVerdict,
};

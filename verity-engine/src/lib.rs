//! Runtime facade: wires storage, index, pipeline, propagation, zones,
//! events, and resolution behind one process-wide singleton plus the
//! single-id operations that don't live in any of those crates.

pub mod dispatch;
pub mod operations;
pub mod runtime;

pub use dispatch::LoggingEventDispatcher;
pub use operations::{FindHit, FindRequest, ReferenceDirection, StatsSnapshot};
pub use runtime::{get, initialize, is_initialized, RuntimeOptions, VerityRuntime};

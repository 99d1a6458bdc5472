//! # verity-resolution
//!
//! C9 — applies a time-bound memory's real-world outcome back onto the graph:
//! void is a no-op beyond marking, correct recovers support edges, incorrect
//! triggers a core-level shock cascade.

pub mod resolver;

pub use resolver::{Resolver, ResolutionSummary};

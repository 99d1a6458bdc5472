//! # verity-propagation
//!
//! Confidence propagation across the belief graph: a bounded local cascade
//! triggered by a single violation (C5), and a periodic full-graph damped
//! fixed-point pass over every positive-edge component (C6).

pub mod full_graph;
pub mod graph;
pub mod shock;

pub use full_graph::{FullGraphPropagator, PropagationReport};
pub use graph::BeliefGraph;
pub use shock::LocalShockPropagator;

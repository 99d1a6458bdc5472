use std::collections::HashMap;

use crate::errors::VerityResult;

/// Result of a local shock cascade (C5): the accepted confidence updates plus
/// bookkeeping for why iteration stopped.
#[derive(Debug, Clone)]
pub struct ShockResult {
    pub updates: HashMap<String, f64>,
    pub iterations: usize,
    pub backtracks: usize,
    pub converged: bool,
}

/// The C5 local shock cascade, called by C4 when a core violation lands.
/// Kept as a trait so `verity-pipeline` doesn't need a hard dependency on
/// `verity-propagation`'s internals — `verity-engine` wires the concrete
/// implementation in.
pub trait ShockPropagator: Send + Sync {
    fn propagate(&self, seed_id: &str, magnitude: f64) -> VerityResult<ShockResult>;
}

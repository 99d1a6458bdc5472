use serde::{Deserialize, Serialize};

use crate::constants::{
    PROPAGATION_ALPHA, PROPAGATION_CONVERGENCE_EPS, PROPAGATION_ETA, PROPAGATION_MAX_ITERATIONS,
    PROPAGATION_MIN_STRENGTH,
};

/// Full-graph propagator (C6) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    pub min_strength: f64,
    pub alpha: f64,
    pub eta: f64,
    pub convergence_eps: f64,
    pub max_iterations: usize,
    /// Interval between scheduled nightly runs, in seconds.
    pub interval_secs: u64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            min_strength: PROPAGATION_MIN_STRENGTH,
            alpha: PROPAGATION_ALPHA,
            eta: PROPAGATION_ETA,
            convergence_eps: PROPAGATION_CONVERGENCE_EPS,
            max_iterations: PROPAGATION_MAX_ITERATIONS,
            interval_secs: 24 * 3_600,
        }
    }
}

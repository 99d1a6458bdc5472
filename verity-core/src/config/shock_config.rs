use serde::{Deserialize, Serialize};

use crate::constants::{
    CORE_SHOCK_MAGNITUDE, PERIPHERAL_SHOCK_MAGNITUDE, SHOCK_CONVERGENCE_EPS, SHOCK_GAMMA,
    SHOCK_MAX_BACKTRACKS, SHOCK_MAX_DEPTH, SHOCK_MAX_ITERATIONS, SHOCK_POWER_ITERATION_STEPS,
};

/// Local shock propagator (C5) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShockConfig {
    pub core_magnitude: f64,
    pub peripheral_magnitude: f64,
    pub gamma: f64,
    pub max_depth: usize,
    pub max_backtracks: usize,
    pub power_iteration_steps: usize,
    pub convergence_eps: f64,
    pub max_iterations: usize,
}

impl Default for ShockConfig {
    fn default() -> Self {
        Self {
            core_magnitude: CORE_SHOCK_MAGNITUDE,
            peripheral_magnitude: PERIPHERAL_SHOCK_MAGNITUDE,
            gamma: SHOCK_GAMMA,
            max_depth: SHOCK_MAX_DEPTH,
            max_backtracks: SHOCK_MAX_BACKTRACKS,
            power_iteration_steps: SHOCK_POWER_ITERATION_STEPS,
            convergence_eps: SHOCK_CONVERGENCE_EPS,
            max_iterations: SHOCK_MAX_ITERATIONS,
        }
    }
}

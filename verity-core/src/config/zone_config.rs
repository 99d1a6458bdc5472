use serde::{Deserialize, Serialize};

use crate::constants::{ZONE_LAMBDA, ZONE_MAX_DEPTH, ZONE_RHO, ZONE_SURVIVAL_RATIO};

/// Zone builder (C7) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub lambda: f64,
    pub rho: f64,
    pub max_depth: usize,
    pub survival_ratio: f64,
    pub default_semantic_top_k: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            lambda: ZONE_LAMBDA,
            rho: ZONE_RHO,
            max_depth: ZONE_MAX_DEPTH,
            survival_ratio: ZONE_SURVIVAL_RATIO,
            default_semantic_top_k: 10,
        }
    }
}

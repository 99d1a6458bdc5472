use serde::{Deserialize, Serialize};

use crate::constants::{SESSION_INACTIVITY_SECS, STUCK_CLAIM_GRACE_SECS};

/// Event queue & session dispatcher (C8) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    pub inactivity_secs: i64,
    pub stuck_claim_grace_secs: i64,
    pub sweep_interval_secs: u64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            inactivity_secs: SESSION_INACTIVITY_SECS,
            stuck_claim_grace_secs: STUCK_CLAIM_GRACE_SECS,
            sweep_interval_secs: 10,
        }
    }
}

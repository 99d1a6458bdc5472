use serde::{Deserialize, Serialize};

use crate::constants::LLM_ARBITER_TIMEOUT_SECS;

/// LLM arbiter configuration. The arbiter itself is an out-of-scope external
/// collaborator (spec §1); this only configures how we reach it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArbiterConfig {
    pub llm_judge_url: Option<String>,
    pub llm_judge_api_key: Option<String>,
    pub llm_judge_model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            llm_judge_url: None,
            llm_judge_api_key: None,
            llm_judge_model: None,
            timeout_secs: LLM_ARBITER_TIMEOUT_SECS,
        }
    }
}

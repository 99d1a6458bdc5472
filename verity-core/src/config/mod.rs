pub mod arbiter_config;
pub mod event_config;
pub mod index_config;
pub mod propagation_config;
pub mod shock_config;
pub mod storage_config;
pub mod zone_config;

use serde::{Deserialize, Serialize};

pub use arbiter_config::ArbiterConfig;
pub use event_config::EventConfig;
pub use index_config::IndexConfig;
pub use propagation_config::PropagationConfig;
pub use shock_config::ShockConfig;
pub use storage_config::StorageConfig;
pub use zone_config::ZoneConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerityConfig {
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub shock: ShockConfig,
    pub propagation: PropagationConfig,
    pub zone: ZoneConfig,
    pub event: EventConfig,
    pub arbiter: ArbiterConfig,
    /// Model identifier used for the narrative-reasoning surface, if any.
    pub reasoning_model: Option<String>,
    pub log_level: String,
    pub environment: String,
    pub cors_allowed_origins: Vec<String>,
    pub pushover_user_key: Option<String>,
    pub pushover_app_token: Option<String>,
}

impl Default for VerityConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            index: IndexConfig::default(),
            shock: ShockConfig::default(),
            propagation: PropagationConfig::default(),
            zone: ZoneConfig::default(),
            event: EventConfig::default(),
            arbiter: ArbiterConfig::default(),
            reasoning_model: None,
            log_level: "info".to_string(),
            environment: "development".to_string(),
            cors_allowed_origins: Vec::new(),
            pushover_user_key: None,
            pushover_app_token: None,
        }
    }
}

impl VerityConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Overlay process environment variables onto a base config.
    ///
    /// Only variables that are actually set are applied; everything else keeps
    /// whatever `self` already held (defaults or TOML-sourced values).
    pub fn apply_env(mut self) -> Self {
        if let Ok(v) = std::env::var("REASONING_MODEL") {
            self.reasoning_model = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_JUDGE_URL") {
            self.arbiter.llm_judge_url = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_JUDGE_API_KEY") {
            self.arbiter.llm_judge_api_key = Some(v);
        }
        if let Ok(v) = std::env::var("LLM_JUDGE_MODEL") {
            self.arbiter.llm_judge_model = Some(v);
        }
        if let Ok(v) = std::env::var("CORS_ALLOWED_ORIGINS") {
            self.cors_allowed_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Ok(v) = std::env::var("ENVIRONMENT") {
            self.environment = v;
        }
        if let Ok(v) = std::env::var("PUSHOVER_USER_KEY") {
            self.pushover_user_key = Some(v);
        }
        if let Ok(v) = std::env::var("PUSHOVER_APP_TOKEN") {
            self.pushover_app_token = Some(v);
        }
        self
    }

    /// Load from an optional TOML file path, then overlay environment variables.
    pub fn load(toml_path: Option<&std::path::Path>) -> crate::errors::VerityResult<Self> {
        let base = match toml_path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    crate::errors::VerityError::Config(format!(
                        "failed to read config file {}: {e}",
                        path.display()
                    ))
                })?;
                Self::from_toml(&text).map_err(|e| {
                    crate::errors::VerityError::Config(format!("invalid config TOML: {e}"))
                })?
            }
            None => Self::default(),
        };
        Ok(base.apply_env())
    }
}

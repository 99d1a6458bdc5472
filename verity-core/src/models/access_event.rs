use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only access log entry, for audit and session recap (spec §6
/// `access_events`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessEvent {
    pub entity_id: String,
    pub access_type: AccessType,
    pub session_id: Option<String>,
    pub query_text: Option<String>,
    pub result_rank: Option<u32>,
    pub similarity: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Recall,
    Find,
    Reference,
    Zone,
}

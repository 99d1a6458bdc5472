use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append-only version snapshot, written before every mutating update so the
/// prior state is recoverable (spec §6 `memory_versions`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub entity_id: String,
    pub version_number: u32,
    pub change_type: ChangeType,
    pub content_snapshot: Value,
    pub change_reason: Option<String>,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Updated,
    Retracted,
    Resolved,
    Promoted,
}

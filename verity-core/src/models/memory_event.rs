use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::DamageLevel;

/// A significant, session-scoped event accumulated by C8 for later dispatch
/// (spec §6 `memory_events`, §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub id: String,
    pub session_id: String,
    pub event_type: EventType,
    pub memory_id: String,
    pub violated_by: Option<String>,
    pub damage_level: Option<DamageLevel>,
    pub context: Value,
    pub created_at: DateTime<Utc>,
    pub dispatched: bool,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub workflow_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Violation,
    Confirmation,
    Resolution,
    CoreViolation,
}

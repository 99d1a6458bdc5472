use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::VerityResult;

/// The payload C3 hands off at the end of its commit sequence: everything C4
/// needs to run violation/confirmation detection without re-reading C1/C2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureJob {
    pub memory_id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub invalidates_conditions: Vec<ConditionEmbedding>,
    pub confirms_conditions: Vec<ConditionEmbedding>,
    pub time_bound: bool,
    pub session_id: Option<String>,
    pub request_id: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionEmbedding {
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// An at-least-once FIFO channel for exposure jobs. The spec treats the
/// backing queue as an external collaborator; this crate only needs the
/// enqueue/drain contract so C3 and C4 can be wired independently.
pub trait ExposureQueue: Send + Sync {
    fn enqueue(&self, job: ExposureJob) -> VerityResult<()>;

    /// Drain up to `limit` jobs. Returns fewer than `limit` if the queue is
    /// shorter; returns an empty vec (not an error) when nothing is pending.
    fn drain(&self, limit: usize) -> VerityResult<Vec<ExposureJob>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

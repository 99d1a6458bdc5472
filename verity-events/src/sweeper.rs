//! Claim-then-process sweep: find sessions past their inactivity window,
//! claim their pending events, hand them to a dispatcher, mark them done,
//! and release any claim a crashed dispatcher left stranded.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use verity_core::config::EventConfig;
use verity_core::errors::VerityResult;
use verity_core::traits::{EntityStore, EventDispatcher};

const CLAIM_BATCH_SIZE: usize = 50;

pub struct SessionSweeper {
    store: Arc<dyn EntityStore>,
    dispatcher: Arc<dyn EventDispatcher>,
    config: EventConfig,
}

/// Outcome of one sweep pass, for logging/tests.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub sessions_dispatched: usize,
    pub events_dispatched: usize,
    pub stuck_claims_released: usize,
}

impl SessionSweeper {
    pub fn new(store: Arc<dyn EntityStore>, dispatcher: Arc<dyn EventDispatcher>, config: EventConfig) -> Self {
        Self { store, dispatcher, config }
    }

    /// One pass: release stranded claims first (so their rows are eligible
    /// again this same pass), then claim-and-dispatch every inactive session.
    pub fn sweep(&self) -> VerityResult<SweepReport> {
        let mut report = SweepReport::default();

        let grace = chrono::Duration::seconds(self.config.stuck_claim_grace_secs);
        let released = self.store.release_stuck_events(grace)?;
        if released > 0 {
            warn!(released, "released stuck event claims past grace window");
        }
        report.stuck_claims_released = released;

        let cutoff = Utc::now() - chrono::Duration::seconds(self.config.inactivity_secs);
        let sessions = self.store.find_inactive_sessions(cutoff)?;

        for session_id in sessions {
            match self.dispatch_session(&session_id) {
                Ok(count) if count > 0 => {
                    report.sessions_dispatched += 1;
                    report.events_dispatched += count;
                }
                Ok(_) => {}
                Err(e) => error!(session_id, error = %e, "session dispatch failed, claim left for stuck-claim release"),
            }
        }

        info!(
            sessions = report.sessions_dispatched,
            events = report.events_dispatched,
            released = report.stuck_claims_released,
            "event sweep complete"
        );
        Ok(report)
    }

    /// Claim this session's pending events under one workflow id, hand them
    /// to the dispatcher, and mark each dispatched on success. A dispatcher
    /// error leaves the claim in place for `release_stuck_events` to recover.
    fn dispatch_session(&self, session_id: &str) -> VerityResult<usize> {
        let events = self.store.claim_events(session_id, CLAIM_BATCH_SIZE)?;
        if events.is_empty() {
            return Ok(0);
        }

        let workflow_id = Uuid::new_v4().to_string();
        self.dispatcher.dispatch(session_id, &events)?;

        for event in &events {
            self.store.mark_event_dispatched(&event.id, Some(&workflow_id))?;
        }
        Ok(events.len())
    }
}

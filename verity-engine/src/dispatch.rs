//! Reference [`EventDispatcher`]: logs a claimed batch at info level. A real
//! deployment swaps this for whatever workflow runner receives
//! `memory_events` rows (webhook, message bus, notification relay); the
//! sweeper doesn't know or care which.

use tracing::info;

use verity_core::errors::VerityResult;
use verity_core::models::MemoryEvent;
use verity_core::traits::EventDispatcher;

#[derive(Default)]
pub struct LoggingEventDispatcher;

impl LoggingEventDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl EventDispatcher for LoggingEventDispatcher {
    fn dispatch(&self, session_id: &str, events: &[MemoryEvent]) -> VerityResult<()> {
        for event in events {
            info!(session_id, event_id = %event.id, memory_id = %event.memory_id, event_type = ?event.event_type, "dispatching event");
        }
        Ok(())
    }
}

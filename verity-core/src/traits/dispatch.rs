use crate::errors::VerityResult;
use crate::models::MemoryEvent;

/// Where a claimed batch of session events actually goes once C8 picks them
/// up. Kept as a trait, the same way `ShockPropagator` is, so `verity-events`
/// doesn't need to know what a caller's workflow runner looks like.
pub trait EventDispatcher: Send + Sync {
    fn dispatch(&self, session_id: &str, events: &[MemoryEvent]) -> VerityResult<()>;
}

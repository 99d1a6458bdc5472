//! # verity-events
//!
//! The C8 session dispatcher: a periodic sweep over `memory_events` rows that
//! claims each inactive session's batch, hands it to a dispatcher, and
//! releases claims a crashed dispatcher left stranded.

pub mod sweeper;

pub use sweeper::{SessionSweeper, SweepReport};

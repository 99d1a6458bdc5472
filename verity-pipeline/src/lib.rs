//! # verity-pipeline
//!
//! The C3 write pipeline and C4 exposure checker: everything that happens
//! between a caller's `observe`/`update` call and a memory's confirmations,
//! contradictions, and support edges reflecting the rest of the graph.

pub mod exposure_checker;
pub mod exposure_queue;
pub mod llm_arbiter;
pub mod validation;
pub mod write_pipeline;

pub use exposure_checker::{ExposureChecker, ExposureOutcome};
pub use exposure_queue::InProcessExposureQueue;
pub use llm_arbiter::{HttpArbiter, SimilarityFallbackArbiter};
pub use write_pipeline::{ObserveOutcome, ObserveRequest, UpdateRequest, WritePipeline};

//! C2 — embedding generation and the three nearest-neighbor condition indexes.

pub mod brute_force;
pub mod hashing_embedder;
pub mod named_indexes;

pub use brute_force::BruteForceIndex;
pub use hashing_embedder::HashingEmbedder;
pub use named_indexes::ConditionIndexes;

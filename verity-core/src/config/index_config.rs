use serde::{Deserialize, Serialize};

use crate::constants::CONDITION_MATCH_THRESHOLD;

/// Embedding/condition index (C2) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Minimum cosine similarity for a condition match.
    pub min_similarity: f64,
    /// Embedding dimensionality produced by the configured embedder.
    pub dimensions: usize,
    /// Size of the query-result cache.
    pub query_cache_size: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_similarity: CONDITION_MATCH_THRESHOLD,
            dimensions: 256,
            query_cache_size: 1_000,
        }
    }
}

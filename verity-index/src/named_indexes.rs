//! The three named indexes C2 exposes: content, `invalidates_if` conditions,
//! `confirms_if` conditions. Wraps pluggable `IndexStore`s with the metadata
//! and embedding cache a real content-addressable store wouldn't necessarily
//! carry, the way `cortex-embeddings`'s L1 cache sits in front of its
//! providers.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use moka::sync::Cache;
use serde_json::Value;

use verity_core::errors::VerityResult;
use verity_core::traits::{Embedder, IndexStore};

use crate::brute_force::BruteForceIndex;

/// One match returned from a named-index query: entity id, similarity, and
/// whatever metadata was stored alongside it at upsert time.
pub type IndexMatch = (String, f64, Option<Value>);

pub struct ConditionIndexes {
    embedder: Arc<dyn Embedder>,
    content: Arc<dyn IndexStore>,
    invalidates: Arc<dyn IndexStore>,
    confirms: Arc<dyn IndexStore>,
    content_metadata: DashMap<String, Value>,
    invalidates_metadata: DashMap<String, Value>,
    confirms_metadata: DashMap<String, Value>,
    embedding_cache: Cache<String, Vec<f32>>,
}

impl ConditionIndexes {
    /// Build with the in-process `BruteForceIndex` reference implementation
    /// backing all three named indexes.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self::with_stores(
            embedder,
            Arc::new(BruteForceIndex::new()),
            Arc::new(BruteForceIndex::new()),
            Arc::new(BruteForceIndex::new()),
        )
    }

    pub fn with_stores(
        embedder: Arc<dyn Embedder>,
        content: Arc<dyn IndexStore>,
        invalidates: Arc<dyn IndexStore>,
        confirms: Arc<dyn IndexStore>,
    ) -> Self {
        let embedding_cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(Duration::from_secs(3600))
            .build();
        Self {
            embedder,
            content,
            invalidates,
            confirms,
            content_metadata: DashMap::new(),
            invalidates_metadata: DashMap::new(),
            confirms_metadata: DashMap::new(),
            embedding_cache,
        }
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embed `text`, reusing a cached vector for identical content.
    pub fn embed_cached(&self, content_hash: &str, text: &str) -> VerityResult<Vec<f32>> {
        if let Some(cached) = self.embedding_cache.get(content_hash) {
            return Ok(cached);
        }
        let vector = self.embedder.embed(text)?;
        self.embedding_cache.insert(content_hash.to_string(), vector.clone());
        Ok(vector)
    }

    pub fn upsert_content(&self, memory_id: &str, vector: &[f32], metadata: Value) -> VerityResult<()> {
        self.content.upsert(memory_id, vector)?;
        self.content_metadata.insert(memory_id.to_string(), metadata);
        Ok(())
    }

    pub fn upsert_invalidates(&self, memory_id: &str, index: usize, vector: &[f32], metadata: Value) -> VerityResult<()> {
        let key = format!("{memory_id}:inv:{index}");
        self.invalidates.upsert(&key, vector)?;
        self.invalidates_metadata.insert(key, metadata);
        Ok(())
    }

    pub fn upsert_confirms(&self, memory_id: &str, index: usize, vector: &[f32], metadata: Value) -> VerityResult<()> {
        let key = format!("{memory_id}:conf:{index}");
        self.confirms.upsert(&key, vector)?;
        self.confirms_metadata.insert(key, metadata);
        Ok(())
    }

    pub fn query_content(&self, vector: &[f32], top_k: usize, min_similarity: f64) -> VerityResult<Vec<IndexMatch>> {
        Self::with_metadata(self.content.query(vector, top_k, min_similarity)?, &self.content_metadata)
    }

    pub fn query_invalidates(&self, vector: &[f32], top_k: usize, min_similarity: f64) -> VerityResult<Vec<IndexMatch>> {
        Self::with_metadata(self.invalidates.query(vector, top_k, min_similarity)?, &self.invalidates_metadata)
    }

    pub fn query_confirms(&self, vector: &[f32], top_k: usize, min_similarity: f64) -> VerityResult<Vec<IndexMatch>> {
        Self::with_metadata(self.confirms.query(vector, top_k, min_similarity)?, &self.confirms_metadata)
    }

    /// Remove every vector (content + condition rows) belonging to `memory_id`.
    pub fn delete_memory(&self, memory_id: &str) -> VerityResult<()> {
        self.content.delete(memory_id)?;
        self.content_metadata.remove(memory_id);

        let inv_prefix = format!("{memory_id}:inv:");
        self.invalidates.delete_by_prefix(&inv_prefix)?;
        self.invalidates_metadata.retain(|k, _| !k.starts_with(&inv_prefix));

        let conf_prefix = format!("{memory_id}:conf:");
        self.confirms.delete_by_prefix(&conf_prefix)?;
        self.confirms_metadata.retain(|k, _| !k.starts_with(&conf_prefix));

        Ok(())
    }

    fn with_metadata(
        hits: Vec<(String, f64)>,
        metadata: &DashMap<String, Value>,
    ) -> VerityResult<Vec<IndexMatch>> {
        Ok(hits
            .into_iter()
            .map(|(id, sim)| {
                let meta = metadata.get(&id).map(|entry| entry.value().clone());
                (id, sim, meta)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing_embedder::HashingEmbedder;
    use serde_json::json;

    fn indexes() -> ConditionIndexes {
        ConditionIndexes::new(Arc::new(HashingEmbedder::new(128)))
    }

    #[test]
    fn content_query_carries_stored_metadata() {
        let idx = indexes();
        let v = idx.embed_cached("h1", "revenue rose year over year").unwrap();
        idx.upsert_content("m1", &v, json!({"type": "observation"})).unwrap();

        let hits = idx.query_content(&v, 5, 0.0).unwrap();
        assert_eq!(hits[0].0, "m1");
        assert_eq!(hits[0].2.as_ref().unwrap()["type"], "observation");
    }

    #[test]
    fn condition_indexes_are_independent_of_content_index() {
        let idx = indexes();
        let v = idx.embed_cached("h1", "revenue fell quarter over quarter").unwrap();
        idx.upsert_invalidates("m1", 0, &v, json!({"memory_id": "m1", "condition_index": 0})).unwrap();

        assert_eq!(idx.query_content(&v, 5, 0.0).unwrap().len(), 0);
        assert_eq!(idx.query_invalidates(&v, 5, 0.0).unwrap().len(), 1);
    }

    #[test]
    fn delete_memory_clears_content_and_condition_rows() {
        let idx = indexes();
        let v = idx.embed_cached("h1", "revenue rose").unwrap();
        idx.upsert_content("m1", &v, json!({})).unwrap();
        idx.upsert_invalidates("m1", 0, &v, json!({})).unwrap();
        idx.upsert_confirms("m1", 0, &v, json!({})).unwrap();

        idx.delete_memory("m1").unwrap();

        assert_eq!(idx.query_content(&v, 5, 0.0).unwrap().len(), 0);
        assert_eq!(idx.query_invalidates(&v, 5, 0.0).unwrap().len(), 0);
        assert_eq!(idx.query_confirms(&v, 5, 0.0).unwrap().len(), 0);
    }

    #[test]
    fn embed_cached_reuses_vector_for_same_hash() {
        let idx = indexes();
        let a = idx.embed_cached("h1", "revenue rose").unwrap();
        let b = idx.embed_cached("h1", "a completely different string").unwrap();
        assert_eq!(a, b, "same content hash should short-circuit to the cached vector");
    }
}

use crate::errors::VerityResult;

/// Embedding generation, abstracted behind a trait so the default hashing
/// fallback can be swapped for a real provider without touching callers.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> VerityResult<Vec<f32>>;
    fn embed_batch(&self, texts: &[String]) -> VerityResult<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
    fn dimensions(&self) -> usize;
    fn name(&self) -> &str;
}

/// One of the three named condition indexes (content / `invalidates_if` /
/// `confirms_if`), or a freestanding semantic-search index over memory content.
pub trait IndexStore: Send + Sync {
    /// Insert or replace the vector for `entity_id` under this index.
    fn upsert(&self, entity_id: &str, embedding: &[f32]) -> VerityResult<()>;

    /// Remove every vector whose entity id starts with `prefix` (used when a
    /// memory's condition list shrinks and stale condition vectors must go).
    fn delete_by_prefix(&self, prefix: &str) -> VerityResult<usize>;

    fn delete(&self, entity_id: &str) -> VerityResult<()>;

    /// Cosine-similarity search, closest first, filtered to `min_similarity`.
    fn query(&self, embedding: &[f32], top_k: usize, min_similarity: f64) -> VerityResult<Vec<(String, f64)>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

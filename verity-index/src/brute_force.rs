//! In-process reference `IndexStore`: cosine similarity over a `dashmap`-guarded
//! map of vectors. Not an optimized ANN structure — a real deployment plugs in
//! its own content-addressable nearest-neighbor store; this one is sized for the
//! graph scale this engine targets.

use dashmap::DashMap;

use verity_core::errors::VerityResult;
use verity_core::traits::IndexStore;

pub struct BruteForceIndex {
    vectors: DashMap<String, Vec<f32>>,
}

impl BruteForceIndex {
    pub fn new() -> Self {
        Self { vectors: DashMap::new() }
    }

    fn cosine(a: &[f32], b: &[f32]) -> f64 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
            return 0.0;
        }
        (dot / (norm_a * norm_b)) as f64
    }
}

impl Default for BruteForceIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexStore for BruteForceIndex {
    fn upsert(&self, entity_id: &str, embedding: &[f32]) -> VerityResult<()> {
        self.vectors.insert(entity_id.to_string(), embedding.to_vec());
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> VerityResult<usize> {
        let to_remove: Vec<String> = self
            .vectors
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect();
        for key in &to_remove {
            self.vectors.remove(key);
        }
        Ok(to_remove.len())
    }

    fn delete(&self, entity_id: &str) -> VerityResult<()> {
        self.vectors.remove(entity_id);
        Ok(())
    }

    fn query(&self, embedding: &[f32], top_k: usize, min_similarity: f64) -> VerityResult<Vec<(String, f64)>> {
        let mut scored: Vec<(String, f64)> = self
            .vectors
            .iter()
            .map(|entry| (entry.key().clone(), Self::cosine(embedding, entry.value())))
            .filter(|(_, sim)| *sim >= min_similarity)
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_excludes_below_threshold() {
        let idx = BruteForceIndex::new();
        idx.upsert("a", &[1.0, 0.0]).unwrap();
        idx.upsert("b", &[0.0, 1.0]).unwrap();

        let results = idx.query(&[1.0, 0.0], 10, 0.35).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn exact_threshold_boundary_is_inclusive() {
        let idx = BruteForceIndex::new();
        // cos(theta) between [1,0] and [0.35, sqrt(1-0.35^2)] is exactly 0.35.
        let y = (1.0_f32 - 0.35_f32.powi(2)).sqrt();
        idx.upsert("boundary", &[0.35, y]).unwrap();

        let results = idx.query(&[1.0, 0.0], 10, 0.35).unwrap();
        assert_eq!(results.len(), 1, "0.35 similarity should be a match at threshold 0.35");
    }

    #[test]
    fn delete_by_prefix_removes_matching_entries_only() {
        let idx = BruteForceIndex::new();
        idx.upsert("m1:inv:0", &[1.0, 0.0]).unwrap();
        idx.upsert("m1:inv:1", &[0.0, 1.0]).unwrap();
        idx.upsert("m2:inv:0", &[1.0, 1.0]).unwrap();

        let removed = idx.delete_by_prefix("m1:").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn query_respects_top_k() {
        let idx = BruteForceIndex::new();
        for i in 0..5 {
            idx.upsert(&format!("m{i}"), &[1.0, 0.01 * i as f32]).unwrap();
        }
        let results = idx.query(&[1.0, 0.0], 2, 0.0).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn is_empty_follows_len() {
        let idx = BruteForceIndex::new();
        assert!(idx.is_empty());
        idx.upsert("a", &[1.0]).unwrap();
        assert!(!idx.is_empty());
    }
}

//! Deterministic, dependency-free embedding fallback.
//!
//! Hashes terms into fixed-dimension buckets and weights by term frequency.
//! Not as semantically rich as a neural embedder, but always available, so the
//! engine is runnable without a real provider configured.

use std::collections::HashMap;

use verity_core::errors::VerityResult;
use verity_core::traits::Embedder;

pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_term(term: &str, dims: usize) -> usize {
        let mut h: u64 = 0xcbf29ce484222325;
        for b in term.as_bytes() {
            h ^= *b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        (h as usize) % dims
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| s.len() >= 2)
            .map(|s| s.to_lowercase())
            .collect()
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let tokens = Self::tokenize(text);
        if tokens.is_empty() {
            return vec![0.0; self.dimensions];
        }

        let mut tf: HashMap<String, f32> = HashMap::new();
        for tok in &tokens {
            *tf.entry(tok.clone()).or_default() += 1.0;
        }

        let total = tokens.len() as f32;
        let mut vec = vec![0.0f32; self.dimensions];
        for (term, count) in &tf {
            let freq = count / total;
            let idf = 1.0 + (term.len() as f32).ln();
            let bucket = Self::hash_term(term, self.dimensions);
            vec[bucket] += freq * idf;
        }

        let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> VerityResult<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hashing-fallback"
    }
}

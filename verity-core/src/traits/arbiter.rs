use crate::errors::VerityResult;

/// Verdict from an arbiter asked whether an update changes a memory's thesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThesisVerdict {
    /// The update is a restatement; history and counters carry forward.
    SameThesis,
    /// The update asserts something materially different; treat as a new claim.
    ChangedThesis,
}

/// External judge consulted by the write pipeline's thesis-change guard (§4.3)
/// when a content update's similarity to the prior content falls in the
/// ambiguous band. Backed by an LLM in production; a deterministic stand-in
/// is used in tests.
pub trait ThesisArbiter: Send + Sync {
    fn judge(&self, old_content: &str, new_content: &str) -> VerityResult<ThesisVerdict>;
}

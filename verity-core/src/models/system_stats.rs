//! Well-known `system_stats` keys (spec §6) and the evidence-weight formula
//! (spec §4.6) that consumes `max_times_tested`.

use crate::constants::DEFAULT_MAX_TIMES_TESTED;

pub const KEY_MAX_TIMES_TESTED: &str = "max_times_tested";
pub const KEY_MEDIAN_TIMES_TESTED: &str = "median_times_tested";

pub fn learned_confidence_key(source: &str) -> String {
    format!("source:{source}:learned_confidence")
}

/// `w(t) = log(1 + t) / log(1 + max_times_tested)`, clamped to `[0, 1]`.
///
/// Falls back to `max_times_tested = 10` until the nightly job has run, per
/// spec §6.
pub fn evidence_weight(times_tested: u32, max_times_tested: Option<f64>) -> f64 {
    let max_t = max_times_tested.unwrap_or(DEFAULT_MAX_TIMES_TESTED).max(1.0);
    let w = (1.0 + times_tested as f64).ln() / (1.0 + max_t).ln();
    w.clamp(0.0, 1.0)
}

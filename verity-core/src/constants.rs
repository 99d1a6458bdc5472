//! Tunable constants shared across the belief-graph engine.
//!
//! These mirror the numeric parameters named in the spec; subsystem `Config`
//! structs default to these but can override them per deployment.

/// Maximum content length for a memory, in characters.
pub const MAX_CONTENT_CHARS: usize = 10_000;

/// Maximum serialized length of the `tags` array, in characters.
pub const MAX_TAGS_SERIALIZED_CHARS: usize = 500;

/// Maximum length of a single falsifiability/confirmation condition, in characters.
pub const MAX_CONDITION_CHARS: usize = 1_000;

/// Request body cap, in bytes.
pub const MAX_REQUEST_BODY_BYTES: usize = 50_000;

/// Centrality threshold above which damage is `core` rather than `peripheral`.
pub const CORE_CENTRALITY_THRESHOLD: u32 = 5;

/// Minimum cosine similarity for a condition match to count.
pub const CONDITION_MATCH_THRESHOLD: f64 = 0.35;

/// Cosine-similarity threshold below which a content update is treated as a
/// possible thesis change and routed to the arbiter.
pub const THESIS_CHANGE_REVIEW_THRESHOLD: f64 = 0.7;

/// Below this similarity, a thesis change is assumed even without the arbiter.
pub const THESIS_CHANGE_ASSUME_THRESHOLD: f64 = 0.5;

/// Starting confidence used when a memory's source has no learned track record.
pub const DEFAULT_STARTING_CONFIDENCE: f64 = 0.50;

/// Edge-strength decay factor for a `core` violation.
pub const CORE_DECAY_FACTOR: f64 = 0.5;

/// Edge-strength decay factor for a `peripheral` violation.
pub const PERIPHERAL_DECAY_FACTOR: f64 = 0.25;

/// Edge-strength recovery multiplier on confirmation.
pub const RECOVERY_MULTIPLIER: f64 = 1.1;

/// Initial shock magnitude for a `core` violation.
pub const CORE_SHOCK_MAGNITUDE: f64 = 0.4;

/// Initial shock magnitude for a `peripheral` violation.
pub const PERIPHERAL_SHOCK_MAGNITUDE: f64 = 0.15;

/// Shock decay factor applied at each hop of the cascade.
pub const SHOCK_GAMMA: f64 = 0.7;

/// Maximum BFS depth for the shock cascade.
pub const SHOCK_MAX_DEPTH: usize = 4;

/// Maximum backtracks allowed when the spectral-radius guard trips.
pub const SHOCK_MAX_BACKTRACKS: usize = 3;

/// Power-iteration steps used to estimate the spectral radius.
pub const SHOCK_POWER_ITERATION_STEPS: usize = 5;

/// Convergence threshold for the shock cascade (max |Δh|).
pub const SHOCK_CONVERGENCE_EPS: f64 = 1e-3;

/// Maximum iterations for the shock cascade.
pub const SHOCK_MAX_ITERATIONS: usize = 25;

/// Minimum edge strength for the full-graph propagator's positive-edge subgraph.
pub const PROPAGATION_MIN_STRENGTH: f64 = 0.1;

/// Damping factor `α` in the full-graph iteration.
pub const PROPAGATION_ALPHA: f64 = 0.6;

/// Contradiction weight `η` in the full-graph iteration.
pub const PROPAGATION_ETA: f64 = 0.8;

/// Convergence threshold for the full-graph iteration (max |Δx|).
pub const PROPAGATION_CONVERGENCE_EPS: f64 = 1e-4;

/// Maximum iterations for the full-graph iteration.
pub const PROPAGATION_MAX_ITERATIONS: usize = 100;

/// Fallback `max_times_tested` until the nightly job populates `system_stats`.
pub const DEFAULT_MAX_TIMES_TESTED: f64 = 10.0;

/// Zone builder: boundary contradiction penalty `λ`.
pub const ZONE_LAMBDA: f64 = 0.2;

/// Zone builder: boundary external-support penalty `ρ`.
pub const ZONE_RHO: f64 = 0.1;

/// Zone builder: maximum BFS hop depth from the seed.
pub const ZONE_MAX_DEPTH: usize = 2;

/// Overwhelming-violation survival ratio threshold.
pub const ZONE_SURVIVAL_RATIO: f64 = 0.5;

/// Session inactivity window before the C8 sweeper claims a batch, in seconds.
pub const SESSION_INACTIVITY_SECS: i64 = 30;

/// Grace period after which a stuck claim (workflow assigned, never dispatched)
/// is released back to the pool, in seconds.
pub const STUCK_CLAIM_GRACE_SECS: i64 = 300;

/// Age after which a `pending` (embed/enqueue incomplete) row is retried by the
/// background sweeper, in seconds.
pub const PENDING_ROW_RETRY_SECS: i64 = 300;

/// Maximum retries for a retryable dependency error.
pub const MAX_DEPENDENCY_RETRIES: u32 = 3;

/// Timeout for embedding calls.
pub const EMBEDDING_TIMEOUT_SECS: u64 = 5;

/// Timeout for LLM arbiter calls.
pub const LLM_ARBITER_TIMEOUT_SECS: u64 = 20;

/// Timeout for vector index calls.
pub const VECTOR_INDEX_TIMEOUT_SECS: u64 = 10;

/// Timeout for entity store calls.
pub const STORE_TIMEOUT_SECS: u64 = 2;

//! Error taxonomy for the belief-graph engine.
//!
//! Mirrors the five-kind classification from the spec's error-handling
//! design: `validation`, `not_found`, `semantic_guard`, `conflict`,
//! `dependency` (retryable I/O), `internal`. A caller-owned HTTP layer maps
//! these onto status codes without this crate knowing about HTTP.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type VerityResult<T> = Result<T, VerityError>;

#[derive(Debug, Error)]
pub enum VerityError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("semantic guard triggered: {reason}")]
    SemanticGuard { reason: String, hint: Option<String> },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("dependency '{dependency}' failed: {message}")]
    Dependency {
        dependency: &'static str,
        message: String,
        retryable: bool,
    },

    #[error("request body too large: {size} bytes (max {max})")]
    BodyTooLarge { size: usize, max: usize },

    #[error("internal error [{error_code}]: {message}")]
    Internal { error_code: String, message: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl VerityError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn semantic_guard(reason: impl Into<String>, hint: Option<String>) -> Self {
        Self::SemanticGuard {
            reason: reason.into(),
            hint,
        }
    }

    pub fn dependency(dependency: &'static str, message: impl Into<String>, retryable: bool) -> Self {
        Self::Dependency {
            dependency,
            message: message.into(),
            retryable,
        }
    }

    pub fn internal(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Internal {
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    /// Whether an automated retry is sensible for this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Dependency { retryable: true, .. } | Self::Conflict(_))
    }

    /// Representative HTTP status a caller-owned transport layer would use.
    /// Kept here as documentation of the §7 mapping, not as a dependency on HTTP.
    pub fn representative_status(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::SemanticGuard { .. } => 422,
            Self::Conflict(_) => 409,
            Self::BodyTooLarge { .. } => 413,
            Self::Dependency { .. } => 503,
            Self::Storage(_) | Self::Serialization(_) | Self::Config(_) | Self::Internal { .. } => 500,
        }
    }
}

/// Helper mirroring `cortex-storage`'s `to_storage_err`: centralizes the
/// construction of storage errors so call sites stay terse.
pub fn to_storage_err(message: impl Into<String>) -> VerityError {
    VerityError::Storage(message.into())
}

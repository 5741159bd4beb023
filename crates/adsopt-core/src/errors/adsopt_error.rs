use super::validation_issue::ValidationFailure;
use crate::models::ExperimentStatus;

/// Top-level error type for the experiment lifecycle.
///
/// Variants line up with the four failure classes a caller can see: input shape
/// (rejected before any store access), semantic boundary (full issue list),
/// lifecycle preconditions, and store failures. Partial data fetches never
/// surface here; they become pack diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum AdsOptError {
    #[error("invalid document: {reason}")]
    InputShape { reason: String },

    #[error("wrong document kind: expected {expected}, found {found}")]
    KindMismatch { expected: String, found: String },

    #[error("experiment not found: {experiment_id}")]
    ExperimentNotFound { experiment_id: String },

    #[error("semantic validation failed: {0}")]
    SemanticValidation(ValidationFailure),

    #[error("experiment {experiment_id} is {from}; cannot {action}")]
    InvalidTransition {
        experiment_id: String,
        from: ExperimentStatus,
        action: String,
    },

    #[error("experiment {experiment_id} has no executable plan: {reason}")]
    NotExecutable { experiment_id: String, reason: String },

    #[error(
        "concurrent modification of experiment {experiment_id}: expected scope version {expected_version}, found {actual_version}"
    )]
    ConcurrentModification {
        experiment_id: String,
        expected_version: i64,
        actual_version: i64,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error during {operation}: {reason}")]
    Store {
        operation: String,
        reason: String,
        /// Lock contention or timeout rather than a hard failure.
        transient: bool,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdsOptError {
    pub fn input_shape(reason: impl Into<String>) -> Self {
        Self::InputShape {
            reason: reason.into(),
        }
    }

    pub fn store(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            reason: reason.into(),
            transient: false,
        }
    }

    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InputShape { .. } => "invalid_document",
            Self::KindMismatch { .. } => "kind_mismatch",
            Self::ExperimentNotFound { .. } => "experiment_not_found",
            Self::SemanticValidation(_) => "semantic_validation_failed",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::NotExecutable { .. } => "not_executable",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::Config(_) => "config_error",
            Self::Store { .. } => "store_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// HTTP-style status: 4xx for anything the caller can correct, 5xx for store
    /// and configuration failures.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InputShape { .. } | Self::KindMismatch { .. } => 400,
            Self::ExperimentNotFound { .. } => 404,
            Self::InvalidTransition { .. }
            | Self::NotExecutable { .. }
            | Self::ConcurrentModification { .. } => 409,
            Self::SemanticValidation(_) => 422,
            Self::Store { transient: true, .. } => 503,
            Self::Config(_) | Self::Store { .. } | Self::Serialization(_) => 500,
        }
    }

    /// The validation issues carried by this error, if any.
    pub fn issues(&self) -> &[super::ValidationIssue] {
        match self {
            Self::SemanticValidation(failure) => &failure.issues,
            _ => &[],
        }
    }
}

/// Convenience type alias.
pub type AdsOptResult<T> = Result<T, AdsOptError>;

//! RecoveryAction enum: what a caller should do when a lifecycle operation fails.
//!
//! Advisory only. Nothing in this workspace retries automatically.

use std::fmt;

use super::AdsOptError;

/// Recommended recovery action for a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Retry the same request (transient store contention).
    Retry,
    /// Reload the experiment and re-apply the change on the fresh scope.
    Reload,
    /// Correct the document and re-issue it.
    Correct,
    /// Escalate to an operator; the caller cannot fix this.
    Escalate,
}

impl RecoveryAction {
    /// Determine the recommended recovery action for an error.
    pub fn for_error(error: &AdsOptError) -> Self {
        match error {
            AdsOptError::Store {
                transient: true, ..
            } => Self::Retry,

            AdsOptError::ConcurrentModification { .. } => Self::Reload,

            AdsOptError::InputShape { .. }
            | AdsOptError::KindMismatch { .. }
            | AdsOptError::SemanticValidation(_)
            | AdsOptError::InvalidTransition { .. }
            | AdsOptError::NotExecutable { .. }
            | AdsOptError::ExperimentNotFound { .. } => Self::Correct,

            AdsOptError::Config(_) | AdsOptError::Store { .. } | AdsOptError::Serialization(_) => {
                Self::Escalate
            }
        }
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "Retry"),
            Self::Reload => write!(f, "Reload"),
            Self::Correct => write!(f, "Correct"),
            Self::Escalate => write!(f, "Escalate"),
        }
    }
}

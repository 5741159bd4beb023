//! Semantic boundary issues: one entry per bad reference, each carrying enough
//! structure (`code`, `field`, `id`, `recommendation`) for the author of the
//! document, human or agent, to correct it without investigation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// The id does not exist at all.
    EntityNotFound,
    /// The id exists, but under another account/marketplace.
    EntityScopeMismatch,
    /// A referenced backlog item is unknown (or belongs to another ASIN).
    KivIdNotFound,
    /// A review decision names a change id absent from the stored proposal.
    DecisionIdNotFound,
    /// The document was generated for a different experiment.
    ExperimentIdMismatch,
    /// An `override` decision without a replacement value.
    OverrideValueMissing,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntityNotFound => "entity_not_found",
            Self::EntityScopeMismatch => "entity_scope_mismatch",
            Self::KivIdNotFound => "kiv_id_not_found",
            Self::DecisionIdNotFound => "decision_id_not_found",
            Self::ExperimentIdMismatch => "experiment_id_mismatch",
            Self::OverrideValueMissing => "override_value_missing",
        }
    }

    /// Default corrective action for this code.
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::EntityNotFound => {
                "Regenerate the pack from the latest baseline data; the referenced id does not exist."
            }
            Self::EntityScopeMismatch => {
                "Switch to the correct account/marketplace before retrying the import."
            }
            Self::KivIdNotFound => "Pick KIV items for the correct ASIN from the current backlog.",
            Self::DecisionIdNotFound => {
                "Regenerate the review patch against the currently stored proposal."
            }
            Self::ExperimentIdMismatch => {
                "Regenerate the document for this experiment; experiment ids are never rewritten."
            }
            Self::OverrideValueMissing => {
                "Provide override_value for every override decision, or approve/reject instead."
            }
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bad reference inside an inbound document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub code: IssueCode,
    /// JSON path of the offending field, e.g. `plans[0].actions[3].campaign_id`.
    pub field: String,
    /// The offending id or value.
    pub id: String,
    pub recommendation: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        code: IssueCode,
        field: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            field: field.into(),
            id: id.into(),
            recommendation: code.recommendation().to_string(),
            message: message.into(),
        }
    }
}

/// The full list of issues found in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationFailure {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} issue(s)", self.issues.len())?;
        if let Some(first) = self.issues.first() {
            write!(f, "; first: {} at {} ({})", first.code, first.field, first.id)?;
        }
        Ok(())
    }
}

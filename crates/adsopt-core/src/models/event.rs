use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Types of experiment events. Matching is exact; there is no prefix matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentEventType {
    GuardrailBreach,
    ManualIntervention,
    StopLoss,
    Rollback,
    UploadedToAmazon,
}

impl ExperimentEventType {
    pub const ALL: [ExperimentEventType; 5] = [
        Self::GuardrailBreach,
        Self::ManualIntervention,
        Self::StopLoss,
        Self::Rollback,
        Self::UploadedToAmazon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GuardrailBreach => "guardrail_breach",
            Self::ManualIntervention => "manual_intervention",
            Self::StopLoss => "stop_loss",
            Self::Rollback => "rollback",
            Self::UploadedToAmazon => "uploaded_to_amazon",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// Interruptions break the normal course of a run; uploads do not.
    pub fn is_interruption(&self) -> bool {
        !matches!(self, Self::UploadedToAmazon)
    }
}

impl fmt::Display for ExperimentEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentEvent {
    pub event_id: String,
    pub experiment_id: String,
    pub event_type: ExperimentEventType,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

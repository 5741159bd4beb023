//! Persisted evaluation outcome and the derived values that score it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Which tier produced an experiment's evaluation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateWindowSource {
    Scope,
    ValidatedSnapshot,
    OccurredAt,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub source: DateWindowSource,
}

impl DateWindow {
    pub fn missing() -> Self {
        Self {
            start: None,
            end: None,
            source: DateWindowSource::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.source == DateWindowSource::Missing
    }
}

/// Display tone of an outcome score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeTone {
    Positive,
    Mixed,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub imported_at: DateTime<Utc>,
    pub asin: String,
    pub summary: String,
    /// Normalized to 0–100.
    pub score: Option<f64>,
    pub tone: OutcomeTone,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub confidence: Option<serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub why: Vec<String>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    pub window: DateWindow,
    /// Change ids shown on the timeline, interruptions included.
    pub major_action_ids: Vec<String>,
    pub kiv_open: Vec<String>,
    pub kiv_recently_closed: Vec<String>,
    /// KIV ids created or updated by this import.
    #[serde(default)]
    pub kiv_applied: Vec<String>,
}

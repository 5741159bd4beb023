use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity touched by a committed change, with its before/after values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntityLink {
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub before: Value,
    #[serde(default)]
    pub after: Value,
}

/// A committed, already-executed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub change_id: String,
    pub account_id: String,
    pub marketplace: String,
    pub occurred_at: DateTime<Utc>,
    pub channel: String,
    pub change_type: String,
    #[serde(default)]
    pub summary: Option<String>,
    /// Calendar date (`YYYY-MM-DD`) of the data snapshot the change was checked against.
    #[serde(default)]
    pub validated_snapshot_date: Option<String>,
    #[serde(default)]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub entities: Vec<ChangeEntityLink>,
}

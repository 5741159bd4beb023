use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approve,
    Override,
    Reject,
}

/// Review outcome for one proposed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDecision {
    #[serde(alias = "action_id", alias = "action_ref")]
    pub change_id: String,
    pub decision: DecisionKind,
    #[serde(default)]
    pub override_value: Option<Value>,
    #[serde(default)]
    pub note: Option<String>,
}

/// A batch of review decisions for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPatchPack {
    pub experiment_id: String,
    #[serde(default)]
    pub reviewer: Option<String>,
    #[serde(default)]
    pub decisions: Vec<ReviewDecision>,
}

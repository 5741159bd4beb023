//! FinalPlan: the immutable result of merging a proposal with its review patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::plan::{AdChannel, PlanAction};
use super::review::DecisionKind;

/// An action that survived review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalAction {
    /// The action as it will execute (override already applied to `after`).
    pub action: PlanAction,
    /// `Approve` or `Override`; rejected actions never reach the final plan.
    pub decision: DecisionKind,
    pub overridden: bool,
    /// The proposal's original `after`, kept when overridden.
    #[serde(default)]
    pub proposed_after: Option<Value>,
    #[serde(default)]
    pub review_note: Option<String>,
}

/// Executable plan for one channel + run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalPlanEntry {
    pub channel: AdChannel,
    pub run_id: String,
    pub actions: Vec<FinalAction>,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPlanSummary {
    pub total_actions: u32,
    pub approved: u32,
    pub overridden: u32,
    /// Includes `rejected_without_decision`.
    pub rejected: u32,
    /// Actions dropped because no decision named them.
    pub rejected_without_decision: u32,
    pub plans_in: u32,
    pub plans_out: u32,
}

impl FinalPlanSummary {
    /// One-line human-readable summary.
    pub fn describe(&self) -> String {
        format!(
            "{} of {} action(s) kept across {} plan(s): {} approved, {} overridden, {} rejected ({} without a decision)",
            self.approved + self.overridden,
            self.total_actions,
            self.plans_out,
            self.approved,
            self.overridden,
            self.rejected,
            self.rejected_without_decision,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalPlan {
    /// Derived from `input_hash`; identical inputs give identical ids.
    pub pack_id: String,
    /// blake3 of the canonical proposal + review patch.
    pub input_hash: String,
    pub experiment_id: String,
    pub summary: FinalPlanSummary,
    pub plans: Vec<FinalPlanEntry>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

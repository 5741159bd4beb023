//! Typed view of `scope.contract.ads_optimization_v1`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::evaluation::EvaluationRecord;
use super::final_plan::FinalPlan;
use super::plan::BulkgenPlan;
use super::review::ReviewPatchPack;
use super::experiment::CONTRACT_KEY;
use crate::errors::AdsOptResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredProposal {
    /// blake3 of the proposal document as received.
    pub pack_hash: String,
    pub stored_at: DateTime<Utc>,
    #[serde(default)]
    pub asin: Option<String>,
    pub plans: Vec<BulkgenPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReviewPatch {
    pub stored_at: DateTime<Utc>,
    pub patch: ReviewPatchPack,
}

/// One bulksheet generation from the final plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub run_id: String,
    pub final_plan_pack_id: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsOptimizationContract {
    pub proposal: Option<StoredProposal>,
    pub review_patch: Option<StoredReviewPatch>,
    pub final_plan: Option<FinalPlan>,
    pub executions: Vec<ExecutionRecord>,
    pub evaluation: Option<EvaluationRecord>,
    /// Questions from a missing-data evaluation, awaiting answers.
    pub pending_questions: Vec<String>,
    /// Keys this version does not model; round-tripped untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdsOptimizationContract {
    /// Read the contract out of a scope document. Missing or null → empty contract.
    pub fn from_scope(scope: &Value) -> AdsOptResult<Self> {
        match scope.get("contract").and_then(|c| c.get(CONTRACT_KEY)) {
            Some(value) if !value.is_null() => Ok(serde_json::from_value(value.clone())?),
            _ => Ok(Self::default()),
        }
    }
}

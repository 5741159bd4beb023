//! Which plan set bulksheet generation may use.

use serde_json::Value;

use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{AdsOptimizationContract, ExperimentStatus, FinalPlan};

/// The final plan of a finalized (or later) experiment. A proposal alone is
/// never executable.
pub fn select_bulkgen_plans_for_execution(experiment_id: &str, scope: &Value) -> AdsOptResult<FinalPlan> {
    let status = ExperimentStatus::from_scope(scope);
    if !status.is_finalized_or_later() {
        return Err(AdsOptError::NotExecutable {
            experiment_id: experiment_id.to_string(),
            reason: format!("status is {}; finalize the reviewed proposal first", status),
        });
    }
    AdsOptimizationContract::from_scope(scope)?
        .final_plan
        .ok_or_else(|| AdsOptError::NotExecutable {
            experiment_id: experiment_id.to_string(),
            reason: format!("status is {} but no final plan is stored", status),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn proposal_alone_is_not_executable() {
        let scope = json!({
            "status": "reviewed",
            "contract": { "ads_optimization_v1": { "proposal": null } }
        });
        let err = select_bulkgen_plans_for_execution("e1", &scope).unwrap_err();
        assert!(matches!(err, AdsOptError::NotExecutable { .. }));
    }

    #[test]
    fn finalized_without_plan_is_not_executable() {
        let err = select_bulkgen_plans_for_execution("e1", &json!({ "status": "FINALIZED" })).unwrap_err();
        assert!(err.to_string().contains("no final plan"));
    }
}

//! Review patch checks that need only the stored proposal, no store lookups.

use std::collections::HashSet;

use adsopt_core::errors::{IssueCode, ValidationIssue};
use adsopt_core::models::{BulkgenPlan, DecisionKind, ReviewPatchPack};

/// Every decision must name an action present in the stored proposal.
pub fn validate_review_patch_decision_ids(
    patch: &ReviewPatchPack,
    proposal_plans: &[BulkgenPlan],
) -> Vec<ValidationIssue> {
    let known: HashSet<&str> = proposal_plans
        .iter()
        .flat_map(|p| p.actions.iter().map(|a| a.action_id.as_str()))
        .collect();

    patch
        .decisions
        .iter()
        .enumerate()
        .filter(|(_, d)| !known.contains(d.change_id.as_str()))
        .map(|(i, d)| {
            ValidationIssue::new(
                IssueCode::DecisionIdNotFound,
                format!("decisions[{}].change_id", i),
                &d.change_id,
                format!(
                    "decision references change '{}', which is not in the stored proposal",
                    d.change_id
                ),
            )
        })
        .collect()
}

/// `override` decisions must carry a non-null replacement value.
pub fn validate_override_values(patch: &ReviewPatchPack) -> Vec<ValidationIssue> {
    patch
        .decisions
        .iter()
        .enumerate()
        .filter(|(_, d)| {
            d.decision == DecisionKind::Override
                && d.override_value.as_ref().map_or(true, |v| v.is_null())
        })
        .map(|(i, d)| {
            ValidationIssue::new(
                IssueCode::OverrideValueMissing,
                format!("decisions[{}].override_value", i),
                &d.change_id,
                format!("override for '{}' has no override_value", d.change_id),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsopt_core::models::{AdChannel, PlanAction, ReviewDecision};
    use serde_json::json;

    fn plans() -> Vec<BulkgenPlan> {
        vec![BulkgenPlan {
            channel: AdChannel::Sp,
            run_id: "r1".into(),
            actions: vec![PlanAction {
                action_id: "a1".into(),
                action_type: "update_bid".into(),
                campaign_id: Some("c1".into()),
                ad_group_id: None,
                target_id: None,
                field: "bid".into(),
                before: json!(1.0),
                after: json!(1.2),
                rationale: None,
            }],
            notes: vec![],
        }]
    }

    fn decision(id: &str, kind: DecisionKind, value: Option<serde_json::Value>) -> ReviewDecision {
        ReviewDecision {
            change_id: id.into(),
            decision: kind,
            override_value: value,
            note: None,
        }
    }

    #[test]
    fn unknown_ids_are_all_reported() {
        let patch = ReviewPatchPack {
            experiment_id: "e1".into(),
            reviewer: None,
            decisions: vec![
                decision("a1", DecisionKind::Approve, None),
                decision("zz", DecisionKind::Reject, None),
                decision("yy", DecisionKind::Approve, None),
            ],
        };
        let issues = validate_review_patch_decision_ids(&patch, &plans());
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "decisions[1].change_id");
        assert_eq!(issues[1].id, "yy");
    }

    #[test]
    fn override_without_value_is_flagged() {
        let patch = ReviewPatchPack {
            experiment_id: "e1".into(),
            reviewer: None,
            decisions: vec![
                decision("a1", DecisionKind::Override, Some(serde_json::Value::Null)),
                decision("a1", DecisionKind::Override, Some(json!(0.9))),
            ],
        };
        let issues = validate_override_values(&patch);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::OverrideValueMissing);
    }
}

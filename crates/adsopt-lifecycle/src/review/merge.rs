//! Review → finalize merge.
//!
//! Every proposed action needs an explicit decision to survive: an action no
//! decision names is rejected, and counted separately so reviewers can see it.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use adsopt_core::errors::{AdsOptError, AdsOptResult, IssueCode, ValidationFailure, ValidationIssue};
use adsopt_core::models::{
    BulkgenPlan, DecisionKind, FinalAction, FinalPlan, FinalPlanEntry, FinalPlanSummary,
    ReviewDecision, ReviewPatchPack,
};

use crate::hashing::{content_hash, short_id};

/// Merge the stored proposal with a review patch into a final plan.
///
/// Deterministic: the same proposal and patch always give the same
/// `input_hash`, `pack_id`, summary and plans. Only `created_at` varies.
pub fn build_final_plan_snapshot(
    experiment_id: &str,
    proposal_plans: &[BulkgenPlan],
    patch: &ReviewPatchPack,
    created_at: DateTime<Utc>,
) -> AdsOptResult<FinalPlan> {
    let mut warnings = Vec::new();

    // Index decisions; on duplicates the last one wins.
    let mut decisions: HashMap<&str, &ReviewDecision> = HashMap::new();
    let mut duplicated: Vec<&str> = Vec::new();
    for decision in &patch.decisions {
        if decisions.insert(decision.change_id.as_str(), decision).is_some()
            && !duplicated.contains(&decision.change_id.as_str())
        {
            duplicated.push(decision.change_id.as_str());
        }
    }
    for id in &duplicated {
        warnings.push(format!(
            "change '{}' has more than one decision; the last one was applied",
            id
        ));
    }

    let proposed_ids: HashSet<&str> = proposal_plans
        .iter()
        .flat_map(|p| p.actions.iter().map(|a| a.action_id.as_str()))
        .collect();
    for decision in &patch.decisions {
        if !proposed_ids.contains(decision.change_id.as_str()) {
            warnings.push(format!(
                "decision for '{}' ignored: the action is no longer in the proposal",
                decision.change_id
            ));
        }
    }

    let mut summary = FinalPlanSummary {
        plans_in: proposal_plans.len() as u32,
        ..FinalPlanSummary::default()
    };
    let mut plans = Vec::with_capacity(proposal_plans.len());

    for plan in proposal_plans {
        let mut actions = Vec::with_capacity(plan.actions.len());
        for action in &plan.actions {
            summary.total_actions += 1;
            let Some(decision) = decisions.get(action.action_id.as_str()) else {
                debug!(experiment_id, action_id = %action.action_id, "No decision; rejecting");
                summary.rejected += 1;
                summary.rejected_without_decision += 1;
                continue;
            };
            match decision.decision {
                DecisionKind::Approve => {
                    summary.approved += 1;
                    actions.push(FinalAction {
                        action: action.clone(),
                        decision: DecisionKind::Approve,
                        overridden: false,
                        proposed_after: None,
                        review_note: decision.note.clone(),
                    });
                }
                DecisionKind::Override => {
                    let value = decision
                        .override_value
                        .clone()
                        .filter(|v| !v.is_null())
                        .ok_or_else(|| missing_override(&action.action_id))?;
                    summary.overridden += 1;
                    let mut executed = action.clone();
                    let proposed_after = std::mem::replace(&mut executed.after, value);
                    actions.push(FinalAction {
                        action: executed,
                        decision: DecisionKind::Override,
                        overridden: true,
                        proposed_after: Some(proposed_after),
                        review_note: decision.note.clone(),
                    });
                }
                DecisionKind::Reject => summary.rejected += 1,
            }
        }
        if !actions.is_empty() {
            plans.push(FinalPlanEntry {
                channel: plan.channel,
                run_id: plan.run_id.clone(),
                actions,
                notes: plan.notes.clone(),
            });
        }
    }
    summary.plans_out = plans.len() as u32;

    if summary.rejected_without_decision > 0 {
        warnings.push(format!(
            "{} action(s) had no review decision and were rejected",
            summary.rejected_without_decision
        ));
    }

    let input_hash = content_hash(&MergeInput {
        experiment_id,
        plans: proposal_plans,
        decisions: &patch.decisions,
    })?;
    let pack_id = short_id("fp", &input_hash);

    info!(
        experiment_id,
        pack_id = %pack_id,
        approved = summary.approved,
        overridden = summary.overridden,
        rejected = summary.rejected,
        without_decision = summary.rejected_without_decision,
        "Final plan built"
    );

    Ok(FinalPlan {
        pack_id,
        input_hash,
        experiment_id: experiment_id.to_string(),
        summary,
        plans,
        warnings,
        created_at,
    })
}

#[derive(Serialize)]
struct MergeInput<'a> {
    experiment_id: &'a str,
    plans: &'a [BulkgenPlan],
    decisions: &'a [ReviewDecision],
}

fn missing_override(action_id: &str) -> AdsOptError {
    AdsOptError::SemanticValidation(ValidationFailure::new(vec![ValidationIssue::new(
        IssueCode::OverrideValueMissing,
        "decisions[].override_value",
        action_id,
        format!("override for '{}' has no override_value", action_id),
    )]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsopt_core::models::{AdChannel, PlanAction};
    use serde_json::json;

    fn action(id: &str, after: f64) -> PlanAction {
        PlanAction {
            action_id: id.into(),
            action_type: "update_bid".into(),
            campaign_id: Some("c1".into()),
            ad_group_id: None,
            target_id: Some(format!("t-{}", id)),
            field: "bid".into(),
            before: json!(1.0),
            after: json!(after),
            rationale: None,
        }
    }

    fn decision(id: &str, kind: DecisionKind, value: Option<serde_json::Value>) -> ReviewDecision {
        ReviewDecision {
            change_id: id.into(),
            decision: kind,
            override_value: value,
            note: None,
        }
    }

    fn proposal() -> Vec<BulkgenPlan> {
        vec![
            BulkgenPlan {
                channel: AdChannel::Sp,
                run_id: "r1".into(),
                actions: vec![action("a1", 1.2), action("a2", 1.5), action("a3", 0.8)],
                notes: vec!["sp".into()],
            },
            BulkgenPlan {
                channel: AdChannel::Sb,
                run_id: "r1".into(),
                actions: vec![action("b1", 2.0)],
                notes: vec![],
            },
        ]
    }

    fn patch(decisions: Vec<ReviewDecision>) -> ReviewPatchPack {
        ReviewPatchPack {
            experiment_id: "e1".into(),
            reviewer: Some("ops".into()),
            decisions,
        }
    }

    #[test]
    fn approve_override_reject() {
        let plan = build_final_plan_snapshot(
            "e1",
            &proposal(),
            &patch(vec![
                decision("a1", DecisionKind::Approve, None),
                decision("a2", DecisionKind::Override, Some(json!(1.35))),
                decision("a3", DecisionKind::Reject, None),
                decision("b1", DecisionKind::Reject, None),
            ]),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(plan.summary.approved, 1);
        assert_eq!(plan.summary.overridden, 1);
        assert_eq!(plan.summary.rejected, 2);
        assert_eq!(plan.plans.len(), 1, "SB plan has no surviving actions");
        let overridden = &plan.plans[0].actions[1];
        assert!(overridden.overridden);
        assert_eq!(overridden.action.after, json!(1.35));
        assert_eq!(overridden.proposed_after, Some(json!(1.5)));
        assert!(plan.pack_id.starts_with("fp_"));
    }

    #[test]
    fn action_without_decision_is_rejected_not_applied() {
        let plan = build_final_plan_snapshot(
            "e1",
            &proposal(),
            &patch(vec![decision("a1", DecisionKind::Approve, None)]),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.summary.approved, 1);
        assert_eq!(plan.summary.rejected_without_decision, 3);
        let kept: Vec<_> = plan
            .plans
            .iter()
            .flat_map(|p| p.actions.iter().map(|a| a.action.action_id.as_str()))
            .collect();
        assert_eq!(kept, vec!["a1"]);
        assert!(plan.warnings.iter().any(|w| w.contains("no review decision")));
    }

    #[test]
    fn duplicate_decisions_last_wins_with_warning() {
        let plan = build_final_plan_snapshot(
            "e1",
            &proposal(),
            &patch(vec![
                decision("a1", DecisionKind::Approve, None),
                decision("a1", DecisionKind::Reject, None),
            ]),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(plan.summary.approved, 0);
        assert!(plan.warnings.iter().any(|w| w.contains("more than one decision")));
    }

    #[test]
    fn stale_decision_becomes_warning() {
        let plan = build_final_plan_snapshot(
            "e1",
            &proposal(),
            &patch(vec![decision("gone", DecisionKind::Approve, None)]),
            Utc::now(),
        )
        .unwrap();
        assert!(plan.warnings.iter().any(|w| w.contains("'gone'")));
    }

    #[test]
    fn override_without_value_fails() {
        let err = build_final_plan_snapshot(
            "e1",
            &proposal(),
            &patch(vec![decision("a1", DecisionKind::Override, None)]),
            Utc::now(),
        )
        .unwrap_err();
        assert!(err.issues().iter().any(|i| i.code == IssueCode::OverrideValueMissing));
    }
}

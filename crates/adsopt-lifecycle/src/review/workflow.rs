//! Lifecycle operations over an experiment's scope.
//!
//! Each operation is one read → validate → compare-and-swap write. Nothing is
//! written when validation fails, and a concurrent writer surfaces as
//! `ConcurrentModification` rather than a lost update.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{
    DocumentKind, ExecutionRecord, Experiment, ExperimentStatus, FinalPlan, InboundPack, ProposalPack,
    ScopeContext, StoredProposal, StoredReviewPatch,
};
use adsopt_core::traits::IRecordStore;

use super::merge::build_final_plan_snapshot;
use super::selection::select_bulkgen_plans_for_execution;
use crate::experiments::{commit_scope, load_experiment};
use crate::hashing::content_hash;
use crate::validation::SemanticGate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalStored {
    pub experiment_id: String,
    /// True when this intake created the experiment row.
    pub created: bool,
    pub status: ExperimentStatus,
    pub pack_hash: String,
    pub plan_count: usize,
    pub action_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewPatchStored {
    pub experiment_id: String,
    pub status: ExperimentStatus,
    pub decision_count: usize,
}

/// Store a proposal pack, creating the experiment on first intake.
///
/// Re-proposing before finalization replaces the proposal and discards any
/// stored review patch, since its decisions referred to the old actions.
pub fn store_proposal(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    doc: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<ProposalStored> {
    let InboundPack::Proposal(pack) = InboundPack::parse_as(doc, DocumentKind::ProductExperimentOutputPack)?
    else {
        return Err(AdsOptError::input_shape("expected a proposal pack"));
    };
    check_unique_action_ids(&pack)?;

    let existing = match load_experiment(store, ctx, experiment_id) {
        Ok(experiment) => Some(experiment),
        Err(AdsOptError::ExperimentNotFound { .. }) => None,
        Err(e) => return Err(e),
    };
    if let Some(experiment) = &existing {
        let status = experiment.status();
        if status.is_finalized_or_later() {
            return Err(AdsOptError::InvalidTransition {
                experiment_id: experiment_id.to_string(),
                from: status,
                action: "replace the proposal".to_string(),
            });
        }
    }

    SemanticGate::new(store, ctx).validate_proposal(experiment_id, &pack)?;

    let created = existing.is_none();
    let mut experiment = match existing {
        Some(experiment) => experiment,
        None => new_experiment(experiment_id, ctx, &pack, now),
    };

    let mut contract = experiment.contract()?;
    if contract.review_patch.take().is_some() {
        warn!(experiment_id, "Proposal replaced; stored review patch discarded");
    }
    let pack_hash = content_hash(doc)?;
    let action_count: usize = pack.plans.iter().map(|p| p.actions.len()).sum();
    let plan_count = pack.plans.len();
    contract.proposal = Some(StoredProposal {
        pack_hash: pack_hash.clone(),
        stored_at: now,
        asin: Some(pack.product.asin.clone()),
        plans: pack.plans,
    });
    contract.pending_questions.clear();

    if experiment.asin.is_none() {
        experiment.asin = Some(pack.product.asin.clone());
    }
    experiment.set_contract(&contract)?;
    experiment.set_status(ExperimentStatus::Proposed);
    if created {
        // First intake writes the row and its proposal scope together.
        store.insert_experiment(&experiment)?;
        info!(experiment_id, asin = %pack.product.asin, "Experiment created on proposal intake");
    } else {
        commit_scope(store, &mut experiment)?;
    }

    info!(experiment_id, plans = plan_count, actions = action_count, created, "Proposal stored");
    Ok(ProposalStored {
        experiment_id: experiment_id.to_string(),
        created,
        status: ExperimentStatus::Proposed,
        pack_hash,
        plan_count,
        action_count,
    })
}

/// Store a review patch against the stored proposal. PROPOSED/REVIEWED → REVIEWED.
pub fn store_review_patch(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    doc: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<ReviewPatchStored> {
    let InboundPack::ReviewPatch(patch) = InboundPack::parse_as(doc, DocumentKind::ReviewPatchPack)? else {
        return Err(AdsOptError::input_shape("expected a review patch pack"));
    };

    let mut experiment = load_experiment(store, ctx, experiment_id)?;
    let status = experiment.status();
    if !matches!(status, ExperimentStatus::Proposed | ExperimentStatus::Reviewed) {
        return Err(AdsOptError::InvalidTransition {
            experiment_id: experiment_id.to_string(),
            from: status,
            action: "store a review patch".to_string(),
        });
    }

    let mut contract = experiment.contract()?;
    let proposal = contract.proposal.as_ref().ok_or_else(|| AdsOptError::InvalidTransition {
        experiment_id: experiment_id.to_string(),
        from: status,
        action: "store a review patch without a stored proposal".to_string(),
    })?;
    SemanticGate::new(store, ctx).validate_review_patch(experiment_id, &patch, &proposal.plans)?;

    let decision_count = patch.decisions.len();
    contract.review_patch = Some(StoredReviewPatch {
        stored_at: now,
        patch,
    });
    experiment.set_contract(&contract)?;
    experiment.set_status(ExperimentStatus::Reviewed);
    commit_scope(store, &mut experiment)?;

    info!(experiment_id, decisions = decision_count, "Review patch stored");
    Ok(ReviewPatchStored {
        experiment_id: experiment_id.to_string(),
        status: ExperimentStatus::Reviewed,
        decision_count,
    })
}

/// Merge the stored proposal and review patch into the final plan.
///
/// Allowed from REVIEWED, and from FINALIZED to regenerate from the stored
/// patch. A regeneration with unchanged inputs returns the stored plan as-is.
pub fn finalize(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    now: DateTime<Utc>,
) -> AdsOptResult<FinalPlan> {
    let mut experiment = load_experiment(store, ctx, experiment_id)?;
    let status = experiment.status();
    if !matches!(status, ExperimentStatus::Reviewed | ExperimentStatus::Finalized) {
        return Err(AdsOptError::InvalidTransition {
            experiment_id: experiment_id.to_string(),
            from: status,
            action: "finalize".to_string(),
        });
    }

    let mut contract = experiment.contract()?;
    let missing = |what: &str| AdsOptError::InvalidTransition {
        experiment_id: experiment_id.to_string(),
        from: status,
        action: format!("finalize without a stored {}", what),
    };
    let proposal = contract.proposal.as_ref().ok_or_else(|| missing("proposal"))?;
    let review = contract.review_patch.as_ref().ok_or_else(|| missing("review patch"))?;

    let plan = build_final_plan_snapshot(experiment_id, &proposal.plans, &review.patch, now)?;

    if let Some(existing) = &contract.final_plan {
        if status == ExperimentStatus::Finalized && existing.input_hash == plan.input_hash {
            info!(experiment_id, pack_id = %existing.pack_id, "Finalize re-run with unchanged inputs");
            return Ok(existing.clone());
        }
    }

    contract.final_plan = Some(plan.clone());
    experiment.set_contract(&contract)?;
    experiment.set_status(ExperimentStatus::Finalized);
    commit_scope(store, &mut experiment)?;

    info!(experiment_id, pack_id = %plan.pack_id, summary = %plan.summary.describe(), "Experiment finalized");
    Ok(plan)
}

/// Record that a bulksheet was generated from the final plan. FINALIZED → EXECUTED.
pub fn mark_bulksheet_generated(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    run_id: &str,
    now: DateTime<Utc>,
) -> AdsOptResult<ExecutionRecord> {
    if run_id.trim().is_empty() {
        return Err(AdsOptError::input_shape("run_id must not be empty"));
    }
    let mut experiment = load_experiment(store, ctx, experiment_id)?;
    let plan = select_bulkgen_plans_for_execution(experiment_id, &experiment.scope)?;

    let record = ExecutionRecord {
        run_id: run_id.to_string(),
        final_plan_pack_id: plan.pack_id,
        generated_at: now,
    };
    let mut contract = experiment.contract()?;
    contract.executions.push(record.clone());
    experiment.set_contract(&contract)?;
    if experiment.status() == ExperimentStatus::Finalized {
        experiment.set_status(ExperimentStatus::Executed);
    }
    commit_scope(store, &mut experiment)?;

    info!(experiment_id, run_id, pack_id = %record.final_plan_pack_id, "Bulksheet generation recorded");
    Ok(record)
}

fn new_experiment(
    experiment_id: &str,
    ctx: &ScopeContext,
    pack: &ProposalPack,
    now: DateTime<Utc>,
) -> Experiment {
    let name = pack
        .name
        .clone()
        .unwrap_or_else(|| format!("{} experiment", pack.product.asin));
    let mut experiment = Experiment::new(
        experiment_id,
        ctx,
        name,
        pack.objective.clone().unwrap_or_default(),
        now,
    );
    experiment.asin = Some(pack.product.asin.clone());
    experiment.hypothesis = pack.hypothesis.clone();
    experiment
}

/// Decisions address actions by id, so ids must be unique across the proposal.
fn check_unique_action_ids(pack: &ProposalPack) -> AdsOptResult<()> {
    let mut seen = HashSet::new();
    for plan in &pack.plans {
        for action in &plan.actions {
            if action.action_id.trim().is_empty() {
                return Err(AdsOptError::input_shape(format!(
                    "{} plan {} has an action without an id",
                    plan.channel, plan.run_id
                )));
            }
            if !seen.insert(action.action_id.as_str()) {
                return Err(AdsOptError::input_shape(format!(
                    "action id '{}' appears more than once in the proposal",
                    action.action_id
                )));
            }
        }
    }
    Ok(())
}

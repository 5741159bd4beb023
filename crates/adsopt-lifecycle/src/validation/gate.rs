//! SemanticGate: reference validation against the live record store.
//!
//! Every reference in a document is checked and every problem is collected;
//! the caller gets the complete list in one `SemanticValidation` error. Store
//! failures during lookups are not issues and propagate as-is.

use std::collections::HashMap;

use tracing::{debug, warn};

use adsopt_core::errors::{AdsOptError, AdsOptResult, IssueCode, ValidationFailure, ValidationIssue};
use adsopt_core::models::{
    BulkgenPlan, EntityKind, EntityRecord, EvaluationBody, EvaluationPack, InboundPack, ProposalPack,
    ReviewPatchPack, ScopeContext,
};
use adsopt_core::traits::IRecordStore;

use super::decision_ids::{validate_override_values, validate_review_patch_decision_ids};

/// Validates inbound documents for one account/marketplace.
pub struct SemanticGate<'a> {
    store: &'a dyn IRecordStore,
    ctx: &'a ScopeContext,
}

impl<'a> SemanticGate<'a> {
    pub fn new(store: &'a dyn IRecordStore, ctx: &'a ScopeContext) -> Self {
        Self { store, ctx }
    }

    /// Validate any inbound pack. Review patches need the stored proposal plans.
    pub fn validate(
        &self,
        target_experiment_id: &str,
        pack: &InboundPack,
        proposal_plans: &[BulkgenPlan],
    ) -> AdsOptResult<()> {
        match pack {
            InboundPack::Proposal(p) => self.validate_proposal(target_experiment_id, p),
            InboundPack::ReviewPatch(p) => {
                self.validate_review_patch(target_experiment_id, p, proposal_plans)
            }
            InboundPack::Evaluation(p) => self.validate_evaluation(target_experiment_id, p),
        }
    }

    pub fn validate_proposal(&self, target_experiment_id: &str, pack: &ProposalPack) -> AdsOptResult<()> {
        let mut run = ValidationRun::new(self.store, self.ctx);
        run.check_experiment_id(target_experiment_id, &pack.experiment_id);
        run.check_entity(EntityKind::Product, "product.asin", &pack.product.asin)?;

        for (pi, plan) in pack.plans.iter().enumerate() {
            for (ai, action) in plan.actions.iter().enumerate() {
                let at = |name: &str| format!("plans[{}].actions[{}].{}", pi, ai, name);
                if let Some(id) = &action.campaign_id {
                    run.check_entity(EntityKind::Campaign, &at("campaign_id"), id)?;
                }
                if let Some(id) = &action.ad_group_id {
                    run.check_entity(EntityKind::AdGroup, &at("ad_group_id"), id)?;
                }
                if let Some(id) = &action.target_id {
                    run.check_entity(EntityKind::Target, &at("target_id"), id)?;
                }
            }
        }

        for (i, kiv_id) in pack.kiv_refs.iter().enumerate() {
            run.check_kiv(&format!("kiv_refs[{}]", i), kiv_id, &pack.product.asin)?;
        }

        run.finish("proposal", target_experiment_id)
    }

    pub fn validate_review_patch(
        &self,
        target_experiment_id: &str,
        patch: &ReviewPatchPack,
        proposal_plans: &[BulkgenPlan],
    ) -> AdsOptResult<()> {
        let mut run = ValidationRun::new(self.store, self.ctx);
        run.check_experiment_id(target_experiment_id, &patch.experiment_id);
        run.issues
            .extend(validate_review_patch_decision_ids(patch, proposal_plans));
        run.issues.extend(validate_override_values(patch));
        run.finish("review patch", target_experiment_id)
    }

    pub fn validate_evaluation(&self, target_experiment_id: &str, pack: &EvaluationPack) -> AdsOptResult<()> {
        let mut run = ValidationRun::new(self.store, self.ctx);
        run.check_experiment_id(target_experiment_id, &pack.experiment_id);

        if let Some(product) = &pack.product {
            run.check_entity(EntityKind::Product, "product.asin", &product.asin)?;
            if let EvaluationBody::Complete(evaluation) = &pack.body {
                for (i, update) in evaluation.kiv_updates.iter().enumerate() {
                    if let Some(kiv_id) = &update.kiv_id {
                        run.check_kiv(
                            &format!("evaluation.kiv_updates[{}].kiv_id", i),
                            kiv_id,
                            &product.asin,
                        )?;
                    }
                }
            }
        }

        run.finish("evaluation", target_experiment_id)
    }

    /// Direct backlog writes: the ASIN must be ours, and so must the campaign
    /// or the existing KIV item when one is named.
    pub fn validate_backlog_write(
        &self,
        asin: &str,
        campaign_id: Option<&str>,
        kiv_id: Option<&str>,
    ) -> AdsOptResult<()> {
        let mut run = ValidationRun::new(self.store, self.ctx);
        run.check_entity(EntityKind::Product, "asin", asin)?;
        if let Some(id) = campaign_id {
            run.check_entity(EntityKind::Campaign, "campaign_id", id)?;
        }
        if let Some(id) = kiv_id {
            run.check_kiv("kiv_id", id, asin)?;
        }
        run.finish("backlog write", "-")
    }
}

/// State of one validation pass: collected issues and memoized lookups.
struct ValidationRun<'a> {
    store: &'a dyn IRecordStore,
    ctx: &'a ScopeContext,
    lookups: HashMap<(EntityKind, String), Vec<EntityRecord>>,
    issues: Vec<ValidationIssue>,
}

impl<'a> ValidationRun<'a> {
    fn new(store: &'a dyn IRecordStore, ctx: &'a ScopeContext) -> Self {
        Self {
            store,
            ctx,
            lookups: HashMap::new(),
            issues: Vec::new(),
        }
    }

    fn check_experiment_id(&mut self, target: &str, document: &str) {
        if target != document {
            self.issues.push(ValidationIssue::new(
                IssueCode::ExperimentIdMismatch,
                "experiment_id",
                document,
                format!(
                    "document was generated for experiment '{}', not '{}'",
                    document, target
                ),
            ));
        }
    }

    fn lookup(&mut self, kind: EntityKind, id: &str) -> AdsOptResult<&[EntityRecord]> {
        let key = (kind, id.to_string());
        if !self.lookups.contains_key(&key) {
            let records = self.store.lookup_entity(kind, id)?;
            self.lookups.insert(key.clone(), records);
        }
        Ok(self.lookups.get(&key).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Ids are matched exactly; a padded id is reported, never normalized.
    fn check_entity(&mut self, kind: EntityKind, field: &str, id: &str) -> AdsOptResult<()> {
        let ctx = self.ctx;
        let records = self.lookup(kind, id)?;
        if records.is_empty() {
            let message = if id.trim() != id {
                format!("{} '{}' does not exist (id has surrounding whitespace)", kind, id)
            } else {
                format!("{} '{}' does not exist", kind, id)
            };
            self.issues
                .push(ValidationIssue::new(IssueCode::EntityNotFound, field, id, message));
            return Ok(());
        }
        if !records.iter().any(|r| ctx.matches(&r.account_id, &r.marketplace)) {
            let owner = &records[0];
            let message = format!(
                "{} '{}' belongs to {}/{}, not {}/{}",
                kind, id, owner.account_id, owner.marketplace, ctx.account_id, ctx.marketplace
            );
            self.issues.push(ValidationIssue::new(
                IssueCode::EntityScopeMismatch,
                field,
                id,
                message,
            ));
        }
        Ok(())
    }

    /// A KIV id is valid only for this account/marketplace and ASIN.
    fn check_kiv(&mut self, field: &str, kiv_id: &str, asin: &str) -> AdsOptResult<()> {
        let message = match self.store.get_kiv_item(kiv_id)? {
            None => format!("KIV item '{}' does not exist", kiv_id),
            Some(item) if !self.ctx.matches(&item.account_id, &item.marketplace) => format!(
                "KIV item '{}' belongs to {}/{}",
                kiv_id, item.account_id, item.marketplace
            ),
            Some(item) if item.asin != asin => {
                format!("KIV item '{}' belongs to ASIN {}, not {}", kiv_id, item.asin, asin)
            }
            Some(_) => return Ok(()),
        };
        self.issues
            .push(ValidationIssue::new(IssueCode::KivIdNotFound, field, kiv_id, message));
        Ok(())
    }

    fn finish(self, document: &str, experiment_id: &str) -> AdsOptResult<()> {
        if self.issues.is_empty() {
            debug!(document, experiment_id, lookups = self.lookups.len(), "Semantic validation passed");
            return Ok(());
        }
        warn!(
            document,
            experiment_id,
            issues = self.issues.len(),
            first = %self.issues[0].code,
            "Semantic validation failed"
        );
        Err(AdsOptError::SemanticValidation(ValidationFailure::new(self.issues)))
    }
}

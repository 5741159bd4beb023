//! Evaluation import: validated outcome + derived window, timeline and KIV view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use adsopt_core::config::EvaluationConfig;
use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{
    DateWindow, DocumentKind, Evaluation, EvaluationBody, EvaluationRecord, ExperimentStatus, InboundPack, KivItem,
    KivUpdate, ScopeContext,
};
use adsopt_core::traits::IRecordStore;

use super::kiv::{derive_kiv_carry_forward, KivCarryForward};
use super::outcome::{normalize_outcome_score, outcome_tone};
use super::timeline::derive_timeline;
use super::window::derive_experiment_date_window;
use crate::experiments::{commit_scope, load_experiment};
use crate::validation::SemanticGate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    Evaluated { record: EvaluationRecord },
    /// Stored as pending questions; status unchanged.
    NeedsData { questions: Vec<String> },
}

pub struct EvaluationImporter<'a> {
    store: &'a dyn IRecordStore,
    config: EvaluationConfig,
}

impl<'a> EvaluationImporter<'a> {
    pub fn new(store: &'a dyn IRecordStore, config: EvaluationConfig) -> Self {
        Self { store, config }
    }

    pub fn import(
        &self,
        ctx: &ScopeContext,
        experiment_id: &str,
        doc: &Value,
        now: DateTime<Utc>,
    ) -> AdsOptResult<ImportOutcome> {
        let InboundPack::Evaluation(pack) = InboundPack::parse_as(doc, DocumentKind::EvaluationOutputPack)?
        else {
            return Err(AdsOptError::input_shape("expected an evaluation output pack"));
        };

        let mut experiment = load_experiment(self.store, ctx, experiment_id)?;
        SemanticGate::new(self.store, ctx).validate_evaluation(experiment_id, &pack)?;
        let mut contract = experiment.contract()?;

        let (asin, evaluation) = match (pack.product, pack.body) {
            (_, EvaluationBody::MissingData { questions }) => {
                contract.pending_questions = questions.clone();
                experiment.set_contract(&contract)?;
                commit_scope(self.store, &mut experiment)?;
                info!(experiment_id, questions = questions.len(), "Evaluation deferred: more data requested");
                return Ok(ImportOutcome::NeedsData { questions });
            }
            (Some(product), EvaluationBody::Complete(evaluation)) => (product.asin, evaluation),
            (None, EvaluationBody::Complete(_)) => {
                return Err(AdsOptError::input_shape("evaluation requires product.asin"));
            }
        };

        // An outcome is only meaningful for a plan that was finalized.
        let status = experiment.status();
        if !status.is_finalized_or_later() {
            return Err(AdsOptError::InvalidTransition {
                experiment_id: experiment_id.to_string(),
                from: status,
                action: "import an evaluation".to_string(),
            });
        }

        let changes = self.store.list_changes_for_experiment(experiment_id)?;
        let events = self.store.list_events_for_experiment(experiment_id)?;
        let window = derive_experiment_date_window(&experiment.scope, &changes);
        let timeline = derive_timeline(&changes, &events, self.config.major_action_limit);

        // Apply KIV updates in memory first so the stored view reflects them.
        let mut backlog = self.store.list_kiv_items(ctx, &asin)?;
        let touched = apply_kiv_updates(&mut backlog, &evaluation.kiv_updates, ctx, &asin, experiment_id, now)?;
        let carry = derive_kiv_carry_forward(&backlog, now, self.config.kiv_recent_days);

        let record = build_record(&evaluation, &asin, now, window, timeline.major_action_ids, &carry, &touched);

        contract.evaluation = Some(record.clone());
        contract.pending_questions.clear();
        experiment.set_contract(&contract)?;
        experiment.set_status(ExperimentStatus::Evaluated);
        commit_scope(self.store, &mut experiment)?;

        for item in &touched {
            self.store.upsert_kiv_item(item)?;
        }

        info!(
            experiment_id,
            score = ?record.score,
            tone = ?record.tone,
            window = ?record.window.source,
            kiv_updates = touched.len(),
            "Evaluation imported"
        );
        Ok(ImportOutcome::Evaluated { record })
    }
}

fn build_record(
    evaluation: &Evaluation,
    asin: &str,
    now: DateTime<Utc>,
    window: DateWindow,
    major_action_ids: Vec<String>,
    carry: &KivCarryForward,
    touched: &[KivItem],
) -> EvaluationRecord {
    let score = normalize_outcome_score(evaluation.outcome.score);
    EvaluationRecord {
        imported_at: now,
        asin: asin.to_string(),
        summary: evaluation.summary.clone(),
        score,
        tone: outcome_tone(score),
        label: evaluation.outcome.label.clone(),
        confidence: evaluation.outcome.confidence.clone(),
        tags: evaluation.outcome.tags.clone(),
        why: evaluation.why.clone(),
        next_steps: evaluation.next_steps.clone(),
        window,
        major_action_ids,
        kiv_open: carry.open.iter().map(|i| i.kiv_id.clone()).collect(),
        kiv_recently_closed: carry.recently_closed.iter().map(|i| i.kiv_id.clone()).collect(),
        kiv_applied: touched.iter().map(|i| i.kiv_id.clone()).collect(),
    }
}

/// Update existing items in `backlog` and append new ones. Returns every
/// touched item as it should be persisted.
fn apply_kiv_updates(
    backlog: &mut Vec<KivItem>,
    updates: &[KivUpdate],
    ctx: &ScopeContext,
    asin: &str,
    experiment_id: &str,
    now: DateTime<Utc>,
) -> AdsOptResult<Vec<KivItem>> {
    let mut touched = Vec::with_capacity(updates.len());
    for update in updates {
        let item = match &update.kiv_id {
            Some(kiv_id) => {
                // The gate already confirmed the id for this scope and ASIN.
                let item = backlog
                    .iter_mut()
                    .find(|i| &i.kiv_id == kiv_id)
                    .ok_or_else(|| {
                        AdsOptError::store("apply kiv update", format!("KIV item '{}' vanished during import", kiv_id))
                    })?;
                let was_closed = item.status.is_closed();
                item.status = update.status;
                match (was_closed, update.status.is_closed()) {
                    (false, true) => item.resolved_at = Some(now),
                    (true, false) => item.resolved_at = None,
                    _ => {}
                }
                if let Some(title) = update.title.as_deref().filter(|t| !t.trim().is_empty()) {
                    item.title = title.to_string();
                }
                if let Some(note) = &update.note {
                    item.details = Some(note.clone());
                }
                item.clone()
            }
            None => {
                let item = KivItem {
                    kiv_id: Uuid::new_v4().to_string(),
                    account_id: ctx.account_id.clone(),
                    marketplace: ctx.marketplace.clone(),
                    asin: asin.to_string(),
                    title: update.title.clone().unwrap_or_default(),
                    details: update.note.clone(),
                    status: update.status,
                    created_at: now,
                    resolved_at: update.status.is_closed().then_some(now),
                    source_experiment_id: Some(experiment_id.to_string()),
                };
                backlog.push(item.clone());
                item
            }
        };
        touched.push(item);
    }
    Ok(touched)
}

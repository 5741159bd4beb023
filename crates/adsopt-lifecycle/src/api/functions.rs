//! JSON-in/JSON-out lifecycle functions for a host binding layer.
//!
//! Each returns `AdsOptResult<serde_json::Value>` with an `ok: true` body;
//! wrap with `respond` to get the uniform `{ok:false, ...}` error shape.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use adsopt_core::config::{EvaluationConfig, EvidenceConfig};
use adsopt_core::errors::{AdsOptError, AdsOptResult, RecoveryAction};
use adsopt_core::models::ScopeContext;
use adsopt_core::traits::{IRecordStore, ISpendSource};

use crate::backlog::{self, DriverIntentInput, KivItemInput};
use crate::evaluation::{derive_experiment_date_window, derive_kiv_carry_forward, derive_timeline, EvaluationImporter};
use crate::events::{record_experiment_event, EventInput};
use crate::evidence::{EvidencePackBuilder, EvidenceRequest};
use crate::experiments::load_experiment;
use crate::naming::download_filename;
use crate::review;
use crate::rollback::build_rollback_pack;

fn parse_input<T: DeserializeOwned>(what: &str, input: &Value) -> AdsOptResult<T> {
    serde_json::from_value(input.clone())
        .map_err(|e| AdsOptError::input_shape(format!("invalid {}: {}", what, e)))
}

// ---- 1. adsopt_evidence_pack ----
/// Build an evidence pack for one ASIN and range.
pub fn adsopt_evidence_pack(
    request: &Value,
    config: &EvidenceConfig,
    source: &dyn ISpendSource,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let request: EvidenceRequest = parse_input("evidence request", request)?;
    let builder = EvidencePackBuilder::new(config.clone());
    let pack = builder.build(&request, source, now.date_naive(), now)?;
    let filename = download_filename(
        &format!("evidence_{}_{}", pack.asin, pack.range.range.as_str()),
        "json",
    );
    Ok(json!({ "ok": true, "filename": filename, "pack": pack }))
}

// ---- 2. adsopt_upload_proposal ----
pub fn adsopt_upload_proposal(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    doc: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let stored = review::store_proposal(store, ctx, experiment_id, doc, now)?;
    Ok(json!({ "ok": true, "proposal": stored }))
}

// ---- 3. adsopt_upload_review_patch ----
pub fn adsopt_upload_review_patch(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    doc: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let stored = review::store_review_patch(store, ctx, experiment_id, doc, now)?;
    Ok(json!({ "ok": true, "review_patch": stored }))
}

// ---- 4. adsopt_finalize ----
/// Merge proposal + review patch into the final plan snapshot.
pub fn adsopt_finalize(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let plan = review::finalize(store, ctx, experiment_id, now)?;
    Ok(json!({ "ok": true, "final_plan": plan }))
}

// ---- 5. adsopt_execution_plans ----
/// Plans a bulksheet generator may execute. Never the raw proposal.
pub fn adsopt_execution_plans(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
) -> AdsOptResult<Value> {
    let experiment = load_experiment(store, ctx, experiment_id)?;
    let plan = review::select_bulkgen_plans_for_execution(experiment_id, &experiment.scope)?;
    Ok(json!({
        "ok": true,
        "experiment_id": experiment_id,
        "pack_id": plan.pack_id,
        "plans": plan.plans,
    }))
}

// ---- 6. adsopt_mark_bulksheet_generated ----
pub fn adsopt_mark_bulksheet_generated(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    run_id: &str,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let record = review::mark_bulksheet_generated(store, ctx, experiment_id, run_id, now)?;
    Ok(json!({ "ok": true, "execution": record }))
}

// ---- 7. adsopt_import_evaluation ----
pub fn adsopt_import_evaluation(
    store: &dyn IRecordStore,
    config: &EvaluationConfig,
    ctx: &ScopeContext,
    experiment_id: &str,
    doc: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let outcome = EvaluationImporter::new(store, config.clone()).import(ctx, experiment_id, doc, now)?;
    Ok(json!({ "ok": true, "result": outcome }))
}

// ---- 8. adsopt_record_event ----
pub fn adsopt_record_event(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    input: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let input: EventInput = parse_input("event", input)?;
    let event = record_experiment_event(store, ctx, &input, now)?;
    Ok(json!({ "ok": true, "event": event }))
}

// ---- 9. adsopt_experiment_timeline ----
/// Date window plus merged change/event timeline for an experiment.
pub fn adsopt_experiment_timeline(
    store: &dyn IRecordStore,
    config: &EvaluationConfig,
    ctx: &ScopeContext,
    experiment_id: &str,
) -> AdsOptResult<Value> {
    let experiment = load_experiment(store, ctx, experiment_id)?;
    let changes = store.list_changes_for_experiment(experiment_id)?;
    let events = store.list_events_for_experiment(experiment_id)?;
    let window = derive_experiment_date_window(&experiment.scope, &changes);
    let timeline = derive_timeline(&changes, &events, config.major_action_limit);
    Ok(json!({
        "ok": true,
        "experiment_id": experiment_id,
        "status": experiment.status(),
        "window": window,
        "timeline": timeline,
    }))
}

// ---- 10. adsopt_rollback_pack ----
/// Revert instructions for an experiment's changes, optionally one run only.
pub fn adsopt_rollback_pack(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
    run_id: Option<&str>,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    load_experiment(store, ctx, experiment_id)?;
    let changes = store.list_changes_for_experiment(experiment_id)?;
    let pack = build_rollback_pack(experiment_id, &changes, run_id, now);
    let stem = match run_id {
        Some(run) => format!("rollback_{}_{}", experiment_id, run),
        None => format!("rollback_{}", experiment_id),
    };
    Ok(json!({ "ok": true, "filename": download_filename(&stem, "json"), "pack": pack }))
}

// ---- 11. adsopt_upsert_kiv_item ----
pub fn adsopt_upsert_kiv_item(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    input: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let input: KivItemInput = parse_input("KIV item", input)?;
    let item = backlog::upsert_kiv_item(store, ctx, &input, now)?;
    Ok(json!({ "ok": true, "item": item }))
}

// ---- 12. adsopt_list_kiv_items ----
/// Full backlog for an ASIN plus the carry-forward view.
pub fn adsopt_list_kiv_items(
    store: &dyn IRecordStore,
    config: &EvaluationConfig,
    ctx: &ScopeContext,
    asin: &str,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let items = store.list_kiv_items(ctx, asin)?;
    let carry = derive_kiv_carry_forward(&items, now, config.kiv_recent_days);
    Ok(json!({ "ok": true, "asin": asin, "items": items, "carry_forward": carry }))
}

// ---- 13. adsopt_upsert_driver_intent ----
pub fn adsopt_upsert_driver_intent(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    input: &Value,
    now: DateTime<Utc>,
) -> AdsOptResult<Value> {
    let input: DriverIntentInput = parse_input("driver intent", input)?;
    let intent = backlog::upsert_driver_intent(store, ctx, &input, now)?;
    Ok(json!({ "ok": true, "intent": intent }))
}

// ---- 14. adsopt_list_driver_intents ----
pub fn adsopt_list_driver_intents(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    asin: &str,
) -> AdsOptResult<Value> {
    let intents = store.list_driver_intents(ctx, asin)?;
    Ok(json!({ "ok": true, "asin": asin, "intents": intents }))
}

// ---- Error shape ----

/// `{ok:false, error, code, status, recovery, details:{issues}}`.
pub fn error_response(error: &AdsOptError) -> Value {
    json!({
        "ok": false,
        "error": error.to_string(),
        "code": error.code(),
        "status": error.status_code(),
        "recovery": RecoveryAction::for_error(error).to_string(),
        "details": { "issues": error.issues() },
    })
}

/// Collapse a function result into the response body.
pub fn respond(result: AdsOptResult<Value>) -> Value {
    match result {
        Ok(body) => body,
        Err(e) => {
            if e.status_code() >= 500 {
                tracing::error!(code = e.code(), error = %e, "Lifecycle call failed");
            }
            error_response(&e)
        }
    }
}

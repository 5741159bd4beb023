//! # adsopt-lifecycle
//!
//! The ads-optimization experiment lifecycle: evidence in, reviewed plan out,
//! evaluation back in.
//!
//! ## Modules
//! - `api`: JSON-returning lifecycle functions and the uniform error shape
//! - `backlog`: KIV item and driver intent writes
//! - `dates`: strict calendar date parsing and day arithmetic
//! - `evaluation`: evaluation import, date window, timeline, KIV carry-forward
//! - `events`: experiment event recording
//! - `evidence`: range resolution, coverage, attribution bridge, pack builder
//! - `experiments`: scoped experiment loads and CAS scope commits
//! - `hashing`: blake3 content hashes and derived ids
//! - `naming`: download filename sanitizer
//! - `observability`: tracing subscriber setup
//! - `review`: proposal/review intake, merge engine, finalize, execution selection
//! - `rollback`: rollback packs from the change log
//! - `storage`: reference SQLite record store
//! - `validation`: semantic boundary gate

pub mod api;
pub mod backlog;
pub mod dates;
pub mod evaluation;
pub mod events;
pub mod evidence;
pub mod experiments;
pub mod hashing;
pub mod naming;
pub mod observability;
pub mod review;
pub mod rollback;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use adsopt_core::config::AdsOptConfig;
use adsopt_core::errors::AdsOptResult;
use adsopt_core::models::ScopeContext;

pub use storage::SqliteRecordStore;

/// Config plus an open store, with the clock supplied at call time.
///
/// Every method returns the response body (`ok: true` or the error shape).
pub struct LifecycleRuntime {
    config: AdsOptConfig,
    store: Arc<SqliteRecordStore>,
}

impl LifecycleRuntime {
    /// Validate the config, initialize tracing and open the store it names.
    pub fn open(config: AdsOptConfig) -> AdsOptResult<Self> {
        config.validate()?;
        observability::init_tracing(&config.observability);
        let store = Arc::new(SqliteRecordStore::from_config(&config.storage)?);
        info!(
            db_path = config.storage.db_path.as_deref().unwrap_or(":memory:"),
            readers = store.reader_count(),
            "Lifecycle runtime opened"
        );
        Ok(Self { config, store })
    }

    pub fn with_store(config: AdsOptConfig, store: Arc<SqliteRecordStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &AdsOptConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<SqliteRecordStore> {
        &self.store
    }

    pub fn evidence_pack(&self, request: &Value) -> Value {
        api::respond(api::functions::adsopt_evidence_pack(
            request,
            &self.config.evidence,
            self.store.as_ref(),
            Utc::now(),
        ))
    }

    pub fn upload_proposal(&self, ctx: &ScopeContext, experiment_id: &str, doc: &Value) -> Value {
        api::respond(api::functions::adsopt_upload_proposal(
            self.store.as_ref(),
            ctx,
            experiment_id,
            doc,
            Utc::now(),
        ))
    }

    pub fn upload_review_patch(&self, ctx: &ScopeContext, experiment_id: &str, doc: &Value) -> Value {
        api::respond(api::functions::adsopt_upload_review_patch(
            self.store.as_ref(),
            ctx,
            experiment_id,
            doc,
            Utc::now(),
        ))
    }

    pub fn finalize(&self, ctx: &ScopeContext, experiment_id: &str) -> Value {
        api::respond(api::functions::adsopt_finalize(
            self.store.as_ref(),
            ctx,
            experiment_id,
            Utc::now(),
        ))
    }

    pub fn execution_plans(&self, ctx: &ScopeContext, experiment_id: &str) -> Value {
        api::respond(api::functions::adsopt_execution_plans(self.store.as_ref(), ctx, experiment_id))
    }

    pub fn mark_bulksheet_generated(&self, ctx: &ScopeContext, experiment_id: &str, run_id: &str) -> Value {
        api::respond(api::functions::adsopt_mark_bulksheet_generated(
            self.store.as_ref(),
            ctx,
            experiment_id,
            run_id,
            Utc::now(),
        ))
    }

    pub fn import_evaluation(&self, ctx: &ScopeContext, experiment_id: &str, doc: &Value) -> Value {
        api::respond(api::functions::adsopt_import_evaluation(
            self.store.as_ref(),
            &self.config.evaluation,
            ctx,
            experiment_id,
            doc,
            Utc::now(),
        ))
    }

    pub fn record_event(&self, ctx: &ScopeContext, input: &Value) -> Value {
        api::respond(api::functions::adsopt_record_event(
            self.store.as_ref(),
            ctx,
            input,
            Utc::now(),
        ))
    }

    pub fn experiment_timeline(&self, ctx: &ScopeContext, experiment_id: &str) -> Value {
        api::respond(api::functions::adsopt_experiment_timeline(
            self.store.as_ref(),
            &self.config.evaluation,
            ctx,
            experiment_id,
        ))
    }

    pub fn rollback_pack(&self, ctx: &ScopeContext, experiment_id: &str, run_id: Option<&str>) -> Value {
        api::respond(api::functions::adsopt_rollback_pack(
            self.store.as_ref(),
            ctx,
            experiment_id,
            run_id,
            Utc::now(),
        ))
    }

    pub fn upsert_kiv_item(&self, ctx: &ScopeContext, input: &Value) -> Value {
        api::respond(api::functions::adsopt_upsert_kiv_item(
            self.store.as_ref(),
            ctx,
            input,
            Utc::now(),
        ))
    }

    pub fn list_kiv_items(&self, ctx: &ScopeContext, asin: &str) -> Value {
        api::respond(api::functions::adsopt_list_kiv_items(
            self.store.as_ref(),
            &self.config.evaluation,
            ctx,
            asin,
            Utc::now(),
        ))
    }

    pub fn upsert_driver_intent(&self, ctx: &ScopeContext, input: &Value) -> Value {
        api::respond(api::functions::adsopt_upsert_driver_intent(
            self.store.as_ref(),
            ctx,
            input,
            Utc::now(),
        ))
    }

    pub fn list_driver_intents(&self, ctx: &ScopeContext, asin: &str) -> Value {
        api::respond(api::functions::adsopt_list_driver_intents(self.store.as_ref(), ctx, asin))
    }
}

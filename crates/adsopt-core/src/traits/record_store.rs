//! `IRecordStore` trait: the narrow read/write contract the lifecycle needs
//! from the relational record store.
//!
//! Every scope write is compare-and-swap on `scope_version`; concurrent writers
//! on one experiment get `ConcurrentModification` instead of silently
//! overwriting each other.

use std::sync::Arc;

use serde_json::Value;

use crate::errors::AdsOptResult;
use crate::models::{
    ChangeLogEntry, DriverCampaignIntent, EntityKind, EntityRecord, Experiment, ExperimentEvent,
    KivItem, ScopeContext,
};

pub trait IRecordStore: Send + Sync {
    // ── Experiments ──

    /// Fetch an experiment by id, regardless of account scope.
    fn get_experiment(&self, experiment_id: &str) -> AdsOptResult<Option<Experiment>>;

    /// Insert a new experiment row (scope_version as given, normally 0).
    fn insert_experiment(&self, experiment: &Experiment) -> AdsOptResult<()>;

    /// Replace the scope document if the stored version still equals
    /// `expected_version`. Returns the new version.
    fn update_experiment_scope(
        &self,
        experiment_id: &str,
        expected_version: i64,
        scope: &Value,
    ) -> AdsOptResult<i64>;

    // ── Change log ──

    fn insert_change(&self, change: &ChangeLogEntry) -> AdsOptResult<()>;

    /// Changes linked to an experiment, with their entity links.
    fn list_changes_for_experiment(&self, experiment_id: &str) -> AdsOptResult<Vec<ChangeLogEntry>>;

    // ── Experiment events ──

    fn insert_event(&self, event: &ExperimentEvent) -> AdsOptResult<()>;

    fn list_events_for_experiment(&self, experiment_id: &str) -> AdsOptResult<Vec<ExperimentEvent>>;

    // ── KIV backlog ──

    fn upsert_kiv_item(&self, item: &KivItem) -> AdsOptResult<()>;

    fn get_kiv_item(&self, kiv_id: &str) -> AdsOptResult<Option<KivItem>>;

    fn list_kiv_items(&self, ctx: &ScopeContext, asin: &str) -> AdsOptResult<Vec<KivItem>>;

    // ── Driver campaign intents ──

    fn upsert_driver_intent(&self, intent: &DriverCampaignIntent) -> AdsOptResult<()>;

    fn list_driver_intents(
        &self,
        ctx: &ScopeContext,
        asin: &str,
    ) -> AdsOptResult<Vec<DriverCampaignIntent>>;

    // ── Entity catalog (semantic validation lookups) ──

    fn upsert_entity(&self, record: &EntityRecord) -> AdsOptResult<()>;

    /// Every record with this kind and id, across all accounts/marketplaces.
    fn lookup_entity(&self, kind: EntityKind, entity_id: &str) -> AdsOptResult<Vec<EntityRecord>>;
}

// ── Arc<T> blanket impl ──

impl<T: IRecordStore + ?Sized> IRecordStore for Arc<T> {
    fn get_experiment(&self, experiment_id: &str) -> AdsOptResult<Option<Experiment>> {
        (**self).get_experiment(experiment_id)
    }
    fn insert_experiment(&self, experiment: &Experiment) -> AdsOptResult<()> {
        (**self).insert_experiment(experiment)
    }
    fn update_experiment_scope(
        &self,
        experiment_id: &str,
        expected_version: i64,
        scope: &Value,
    ) -> AdsOptResult<i64> {
        (**self).update_experiment_scope(experiment_id, expected_version, scope)
    }
    fn insert_change(&self, change: &ChangeLogEntry) -> AdsOptResult<()> {
        (**self).insert_change(change)
    }
    fn list_changes_for_experiment(&self, experiment_id: &str) -> AdsOptResult<Vec<ChangeLogEntry>> {
        (**self).list_changes_for_experiment(experiment_id)
    }
    fn insert_event(&self, event: &ExperimentEvent) -> AdsOptResult<()> {
        (**self).insert_event(event)
    }
    fn list_events_for_experiment(&self, experiment_id: &str) -> AdsOptResult<Vec<ExperimentEvent>> {
        (**self).list_events_for_experiment(experiment_id)
    }
    fn upsert_kiv_item(&self, item: &KivItem) -> AdsOptResult<()> {
        (**self).upsert_kiv_item(item)
    }
    fn get_kiv_item(&self, kiv_id: &str) -> AdsOptResult<Option<KivItem>> {
        (**self).get_kiv_item(kiv_id)
    }
    fn list_kiv_items(&self, ctx: &ScopeContext, asin: &str) -> AdsOptResult<Vec<KivItem>> {
        (**self).list_kiv_items(ctx, asin)
    }
    fn upsert_driver_intent(&self, intent: &DriverCampaignIntent) -> AdsOptResult<()> {
        (**self).upsert_driver_intent(intent)
    }
    fn list_driver_intents(
        &self,
        ctx: &ScopeContext,
        asin: &str,
    ) -> AdsOptResult<Vec<DriverCampaignIntent>> {
        (**self).list_driver_intents(ctx, asin)
    }
    fn upsert_entity(&self, record: &EntityRecord) -> AdsOptResult<()> {
        (**self).upsert_entity(record)
    }
    fn lookup_entity(&self, kind: EntityKind, entity_id: &str) -> AdsOptResult<Vec<EntityRecord>> {
        (**self).lookup_entity(kind, entity_id)
    }
}

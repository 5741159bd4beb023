//! `SqliteRecordStore`: the reference record store implementing `IRecordStore`
//! and `ISpendSource` over one SQLite file.
//!
//! Reads go through `with_reader()`, writes through `with_writer()`. Nothing
//! outside this module touches a pooled connection.

use std::path::Path;

use chrono::NaiveDate;
use serde_json::Value;

use adsopt_core::config::StorageConfig;
use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{
    AdChannel, CampaignSpendRow, ChangeLogEntry, DriverCampaignIntent, EntityKind, EntityRecord,
    Experiment, ExperimentEvent, KivItem, ScopeContext, SpendQuery, SpendReconciliationRow,
    TargetSpendRow,
};
use adsopt_core::traits::{ChunkFetchError, ChunkResult, IRecordStore, ISpendSource};

use super::pool::ConnectionPool;
use super::{is_busy_error, migrations, tables};

pub struct SqliteRecordStore {
    pool: ConnectionPool,
}

impl SqliteRecordStore {
    /// Open a file-backed store, creating the parent directory and running
    /// migrations on the writer before any reader is used.
    pub fn open(path: &Path, read_pool_size: usize) -> AdsOptResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AdsOptError::store("create store directory", e.to_string()))?;
            }
        }
        let pool = ConnectionPool::open(path, read_pool_size)?;
        pool.with_writer(|conn| migrations::migrate(conn))?;
        Ok(Self { pool })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> AdsOptResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        pool.with_writer(|conn| migrations::migrate(conn))?;
        Ok(Self { pool })
    }

    pub fn from_config(config: &StorageConfig) -> AdsOptResult<Self> {
        match &config.db_path {
            Some(path) => Self::open(Path::new(path), config.read_pool_size),
            None => Self::open_in_memory(),
        }
    }

    /// Raw read access for operations not covered by a trait method.
    pub fn with_reader<F, T>(&self, f: F) -> AdsOptResult<T>
    where
        F: FnOnce(&rusqlite::Connection) -> AdsOptResult<T>,
    {
        self.pool.with_reader(f)
    }

    /// Raw write access for operations not covered by a trait method.
    pub fn with_writer<F, T>(&self, f: F) -> AdsOptResult<T>
    where
        F: FnOnce(&mut rusqlite::Connection) -> AdsOptResult<T>,
    {
        self.pool.with_writer(f)
    }

    pub fn reader_count(&self) -> usize {
        self.pool.reader_count()
    }

    pub fn is_wal_mode(&self) -> bool {
        self.pool.is_wal_mode()
    }

    // ── Spend seeding (ingestion is out of scope; these feed tests and demos) ──

    pub fn record_campaign_spend(
        &self,
        ctx: &ScopeContext,
        asin: &str,
        day: NaiveDate,
        row: &CampaignSpendRow,
    ) -> AdsOptResult<()> {
        self.pool
            .with_writer(|conn| tables::insert_campaign_spend(conn, ctx, asin, day, row))
    }

    pub fn record_target_spend(
        &self,
        ctx: &ScopeContext,
        asin: &str,
        day: NaiveDate,
        row: &TargetSpendRow,
    ) -> AdsOptResult<()> {
        self.pool
            .with_writer(|conn| tables::insert_target_spend(conn, ctx, asin, day, row))
    }

    pub fn record_spend_reconciliation(
        &self,
        ctx: &ScopeContext,
        asin: &str,
        day: NaiveDate,
        row: &SpendReconciliationRow,
    ) -> AdsOptResult<()> {
        self.pool
            .with_writer(|conn| tables::insert_spend_reconciliation(conn, ctx, asin, day, row))
    }
}

impl IRecordStore for SqliteRecordStore {
    fn get_experiment(&self, experiment_id: &str) -> AdsOptResult<Option<Experiment>> {
        self.pool.with_reader(|conn| tables::get_experiment(conn, experiment_id))
    }

    fn insert_experiment(&self, experiment: &Experiment) -> AdsOptResult<()> {
        self.pool.with_writer(|conn| tables::insert_experiment(conn, experiment))
    }

    fn update_experiment_scope(
        &self,
        experiment_id: &str,
        expected_version: i64,
        scope: &Value,
    ) -> AdsOptResult<i64> {
        self.pool.with_writer(|conn| {
            tables::update_experiment_scope(conn, experiment_id, expected_version, scope)
        })
    }

    fn insert_change(&self, change: &ChangeLogEntry) -> AdsOptResult<()> {
        self.pool.with_writer(|conn| tables::insert_change(conn, change))
    }

    fn list_changes_for_experiment(&self, experiment_id: &str) -> AdsOptResult<Vec<ChangeLogEntry>> {
        self.pool
            .with_reader(|conn| tables::list_changes_for_experiment(conn, experiment_id))
    }

    fn insert_event(&self, event: &ExperimentEvent) -> AdsOptResult<()> {
        self.pool.with_writer(|conn| tables::insert_event(conn, event))
    }

    fn list_events_for_experiment(&self, experiment_id: &str) -> AdsOptResult<Vec<ExperimentEvent>> {
        self.pool
            .with_reader(|conn| tables::list_events_for_experiment(conn, experiment_id))
    }

    fn upsert_kiv_item(&self, item: &KivItem) -> AdsOptResult<()> {
        self.pool.with_writer(|conn| tables::upsert_kiv_item(conn, item))
    }

    fn get_kiv_item(&self, kiv_id: &str) -> AdsOptResult<Option<KivItem>> {
        self.pool.with_reader(|conn| tables::get_kiv_item(conn, kiv_id))
    }

    fn list_kiv_items(&self, ctx: &ScopeContext, asin: &str) -> AdsOptResult<Vec<KivItem>> {
        self.pool.with_reader(|conn| tables::list_kiv_items(conn, ctx, asin))
    }

    fn upsert_driver_intent(&self, intent: &DriverCampaignIntent) -> AdsOptResult<()> {
        self.pool.with_writer(|conn| tables::upsert_driver_intent(conn, intent))
    }

    fn list_driver_intents(
        &self,
        ctx: &ScopeContext,
        asin: &str,
    ) -> AdsOptResult<Vec<DriverCampaignIntent>> {
        self.pool
            .with_reader(|conn| tables::list_driver_intents(conn, ctx, asin))
    }

    fn upsert_entity(&self, record: &EntityRecord) -> AdsOptResult<()> {
        self.pool.with_writer(|conn| tables::upsert_entity(conn, record))
    }

    fn lookup_entity(&self, kind: EntityKind, entity_id: &str) -> AdsOptResult<Vec<EntityRecord>> {
        self.pool.with_reader(|conn| tables::lookup_entity(conn, kind, entity_id))
    }
}

// ─── Spend chunks: lock contention is a timeout, anything else a failure ───

fn chunk_result<T>(result: AdsOptResult<rusqlite::Result<T>>) -> ChunkResult<T> {
    match result {
        Ok(Ok(rows)) => Ok(rows),
        Ok(Err(e)) if is_busy_error(&e) => Err(ChunkFetchError::Timeout {
            reason: e.to_string(),
        }),
        Ok(Err(e)) => Err(ChunkFetchError::Failed {
            reason: e.to_string(),
        }),
        Err(AdsOptError::Store {
            transient: true,
            reason,
            ..
        }) => Err(ChunkFetchError::Timeout { reason }),
        Err(e) => Err(ChunkFetchError::Failed {
            reason: e.to_string(),
        }),
    }
}

impl ISpendSource for SqliteRecordStore {
    fn campaign_spend(
        &self,
        query: &SpendQuery,
        channel: AdChannel,
    ) -> ChunkResult<Vec<CampaignSpendRow>> {
        chunk_result(
            self.pool
                .with_reader(|conn| Ok(tables::query_campaign_spend(conn, query, channel))),
        )
    }

    fn target_spend(&self, query: &SpendQuery) -> ChunkResult<Vec<TargetSpendRow>> {
        chunk_result(
            self.pool
                .with_reader(|conn| Ok(tables::query_target_spend(conn, query))),
        )
    }

    fn spend_reconciliation(&self, query: &SpendQuery) -> ChunkResult<SpendReconciliationRow> {
        chunk_result(
            self.pool
                .with_reader(|conn| Ok(tables::query_spend_reconciliation(conn, query))),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ctx() -> ScopeContext {
        ScopeContext::new("acct-1", "US")
    }

    fn experiment(id: &str) -> Experiment {
        let mut experiment = Experiment::new(
            id,
            &ctx(),
            "Test",
            "Lower ACoS",
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        );
        experiment.asin = Some("B0TEST".to_string());
        experiment
    }

    #[test]
    fn scope_update_is_compare_and_swap() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.insert_experiment(&experiment("exp-1")).unwrap();

        let v1 = store
            .update_experiment_scope("exp-1", 0, &serde_json::json!({"status": "proposed"}))
            .unwrap();
        assert_eq!(v1, 1);

        let err = store
            .update_experiment_scope("exp-1", 0, &serde_json::json!({"status": "reviewed"}))
            .unwrap_err();
        assert!(matches!(
            err,
            AdsOptError::ConcurrentModification { expected_version: 0, actual_version: 1, .. }
        ));

        let stored = store.get_experiment("exp-1").unwrap().unwrap();
        assert_eq!(stored.scope["status"], "proposed");
        assert_eq!(stored.scope_version, 1);
    }

    #[test]
    fn second_insert_of_same_experiment_is_a_concurrent_modification() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.insert_experiment(&experiment("exp-1")).unwrap();
        store
            .update_experiment_scope("exp-1", 0, &serde_json::json!({"status": "proposed"}))
            .unwrap();

        let err = store.insert_experiment(&experiment("exp-1")).unwrap_err();
        assert!(matches!(
            err,
            AdsOptError::ConcurrentModification { expected_version: 0, actual_version: 1, .. }
        ));
        let stored = store.get_experiment("exp-1").unwrap().unwrap();
        assert_eq!(stored.scope["status"], "proposed");
    }

    #[test]
    fn scope_update_on_missing_experiment_is_not_found() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let err = store
            .update_experiment_scope("nope", 0, &serde_json::json!({}))
            .unwrap_err();
        assert!(matches!(err, AdsOptError::ExperimentNotFound { .. }));
    }

    #[test]
    fn spend_queries_sum_inside_the_date_range() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
        for d in [1, 2, 10] {
            store
                .record_campaign_spend(
                    &ctx(),
                    "B0TEST",
                    day(d),
                    &CampaignSpendRow {
                        campaign_id: "c-1".into(),
                        campaign_name: Some("Exact".into()),
                        channel: AdChannel::Sp,
                        spend: 10.0,
                        sales: 30.0,
                    },
                )
                .unwrap();
        }
        let query = SpendQuery {
            context: ScopeContext::new("acct-1", "us"),
            asin: "B0TEST".into(),
            start: day(1),
            end: day(5),
        };
        let rows = store.campaign_spend(&query, AdChannel::Sp).unwrap();
        assert_eq!(rows.len(), 1);
        assert!((rows[0].spend - 20.0).abs() < 1e-9);
        assert!(store.campaign_spend(&query, AdChannel::Sb).unwrap().is_empty());

        let recon = store.spend_reconciliation(&query).unwrap();
        assert_eq!(recon.reported_cost, 0.0);
    }

    #[test]
    fn changes_round_trip_with_links_newest_first() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        for (id, hour) in [("ch-1", 1), ("ch-2", 5)] {
            store
                .insert_change(&ChangeLogEntry {
                    change_id: id.into(),
                    account_id: "acct-1".into(),
                    marketplace: "US".into(),
                    occurred_at: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
                    channel: "sp".into(),
                    change_type: "bid_update".into(),
                    summary: None,
                    validated_snapshot_date: None,
                    experiment_id: Some("exp-1".into()),
                    run_id: Some("run-1".into()),
                    entities: vec![adsopt_core::models::ChangeEntityLink {
                        entity_type: "target".into(),
                        entity_id: "t-1".into(),
                        field: Some("bid".into()),
                        before: serde_json::json!(0.5),
                        after: serde_json::json!(0.7),
                    }],
                })
                .unwrap();
        }
        let changes = store.list_changes_for_experiment("exp-1").unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].change_id, "ch-2");
        assert_eq!(changes[0].entities[0].after, serde_json::json!(0.7));
    }

    #[test]
    fn file_store_uses_wal_and_reader_pool() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRecordStore::open(&dir.path().join("nested").join("adsopt.db"), 2).unwrap();
        assert_eq!(store.reader_count(), 2);
        assert!(store.is_wal_mode());
        store.insert_experiment(&experiment("exp-f")).unwrap();
        assert!(store.get_experiment("exp-f").unwrap().is_some());
    }
}

//! Row-level reads and writes. Every function takes a connection; the engine
//! decides which pooled connection to use.
//!
//! Timestamps are stored as RFC 3339 text, calendar dates as `YYYY-MM-DD`,
//! JSON values as serialized text.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use serde_json::Value;

use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{
    AdChannel, CampaignSpendRow, ChangeEntityLink, ChangeLogEntry, DriverCampaignIntent, EntityKind,
    EntityRecord, Experiment, ExperimentEvent, ExperimentEventType, KivItem, KivStatus, ScopeContext,
    SpendQuery, SpendReconciliationRow, TargetSpendRow,
};

use super::SqlResultExt;

// ── Column conversions ──

fn conversion_error(idx: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, reason.into())
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, format!("bad timestamp '{}': {}", raw, e)))
}

fn opt_ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        None => Ok(None),
        Some(_) => ts_column(row, idx).map(Some),
    }
}

fn json_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Value> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, format!("bad JSON: {}", e)))
}

fn ts(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

fn date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

// ── Experiments ──

const EXPERIMENT_COLUMNS: &str = "experiment_id, account_id, marketplace, asin, name, objective, hypothesis,
     guardrails, evaluation_lag_days, evaluation_window_days, scope, scope_version, created_at";

fn experiment_from_row(row: &Row<'_>) -> rusqlite::Result<Experiment> {
    Ok(Experiment {
        id: row.get(0)?,
        account_id: row.get(1)?,
        marketplace: row.get(2)?,
        asin: row.get(3)?,
        name: row.get(4)?,
        objective: row.get(5)?,
        hypothesis: row.get(6)?,
        guardrails: json_column(row, 7)?,
        evaluation_lag_days: row.get(8)?,
        evaluation_window_days: row.get(9)?,
        scope: json_column(row, 10)?,
        scope_version: row.get(11)?,
        created_at: ts_column(row, 12)?,
    })
}

pub fn get_experiment(conn: &Connection, experiment_id: &str) -> AdsOptResult<Option<Experiment>> {
    let result = conn.query_row(
        &format!("SELECT {} FROM experiments WHERE experiment_id = ?1", EXPERIMENT_COLUMNS),
        params![experiment_id],
        experiment_from_row,
    );
    match result {
        Ok(experiment) => Ok(Some(experiment)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(super::store_error("get experiment", e)),
    }
}

/// Insert a new experiment row with its initial scope. An existing row with the
/// same id (a racing first intake) is a concurrent modification.
pub fn insert_experiment(conn: &Connection, experiment: &Experiment) -> AdsOptResult<()> {
    let now = ts(&Utc::now());
    let inserted = conn.execute(
        "INSERT INTO experiments (experiment_id, account_id, marketplace, asin, name, objective, hypothesis,
             guardrails, evaluation_lag_days, evaluation_window_days, scope, scope_version, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            experiment.id,
            experiment.account_id,
            experiment.marketplace,
            experiment.asin,
            experiment.name,
            experiment.objective,
            experiment.hypothesis,
            serde_json::to_string(&experiment.guardrails)?,
            experiment.evaluation_lag_days,
            experiment.evaluation_window_days,
            serde_json::to_string(&experiment.scope)?,
            experiment.scope_version,
            ts(&experiment.created_at),
            now,
        ],
    );
    match inserted {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(f, _)) if f.code == rusqlite::ffi::ErrorCode::ConstraintViolation => {
            let actual_version: i64 = conn
                .query_row(
                    "SELECT scope_version FROM experiments WHERE experiment_id = ?1",
                    params![experiment.id],
                    |row| row.get(0),
                )
                .op("read scope version")?;
            Err(AdsOptError::ConcurrentModification {
                experiment_id: experiment.id.clone(),
                expected_version: experiment.scope_version,
                actual_version,
            })
        }
        Err(e) => Err(super::store_error("insert experiment", e)),
    }
}

/// Compare-and-swap on `scope_version`. Returns the new version.
pub fn update_experiment_scope(
    conn: &Connection,
    experiment_id: &str,
    expected_version: i64,
    scope: &Value,
) -> AdsOptResult<i64> {
    let new_version = expected_version + 1;
    let updated = conn
        .execute(
            "UPDATE experiments SET scope = ?1, scope_version = ?2, updated_at = ?3
             WHERE experiment_id = ?4 AND scope_version = ?5",
            params![
                serde_json::to_string(scope)?,
                new_version,
                ts(&Utc::now()),
                experiment_id,
                expected_version
            ],
        )
        .op("update experiment scope")?;
    if updated == 1 {
        return Ok(new_version);
    }

    let actual: Option<i64> = match conn.query_row(
        "SELECT scope_version FROM experiments WHERE experiment_id = ?1",
        params![experiment_id],
        |row| row.get(0),
    ) {
        Ok(v) => Some(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(super::store_error("read scope version", e)),
    };
    match actual {
        None => Err(AdsOptError::ExperimentNotFound {
            experiment_id: experiment_id.to_string(),
        }),
        Some(actual_version) => Err(AdsOptError::ConcurrentModification {
            experiment_id: experiment_id.to_string(),
            expected_version,
            actual_version,
        }),
    }
}

// ── Change log ──

/// Insert a change and its entity links in one transaction.
pub fn insert_change(conn: &mut Connection, change: &ChangeLogEntry) -> AdsOptResult<()> {
    let tx = conn.transaction().op("begin change insert")?;
    tx.execute(
        "INSERT INTO change_log (change_id, account_id, marketplace, occurred_at, channel, change_type,
             summary, validated_snapshot_date, experiment_id, run_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            change.change_id,
            change.account_id,
            change.marketplace,
            ts(&change.occurred_at),
            change.channel,
            change.change_type,
            change.summary,
            change.validated_snapshot_date,
            change.experiment_id,
            change.run_id,
        ],
    )
    .op("insert change")?;
    for link in &change.entities {
        tx.execute(
            "INSERT INTO change_entity_links (change_id, entity_type, entity_id, field, before_json, after_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                change.change_id,
                link.entity_type,
                link.entity_id,
                link.field,
                serde_json::to_string(&link.before)?,
                serde_json::to_string(&link.after)?,
            ],
        )
        .op("insert change entity link")?;
    }
    tx.commit().op("commit change insert")?;
    Ok(())
}

pub fn list_changes_for_experiment(conn: &Connection, experiment_id: &str) -> AdsOptResult<Vec<ChangeLogEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT change_id, account_id, marketplace, occurred_at, channel, change_type, summary,
                    validated_snapshot_date, experiment_id, run_id
             FROM change_log WHERE experiment_id = ?1
             ORDER BY occurred_at DESC, change_id DESC",
        )
        .op("list changes")?;
    let rows = stmt
        .query_map(params![experiment_id], |row| {
            Ok(ChangeLogEntry {
                change_id: row.get(0)?,
                account_id: row.get(1)?,
                marketplace: row.get(2)?,
                occurred_at: ts_column(row, 3)?,
                channel: row.get(4)?,
                change_type: row.get(5)?,
                summary: row.get(6)?,
                validated_snapshot_date: row.get(7)?,
                experiment_id: row.get(8)?,
                run_id: row.get(9)?,
                entities: Vec::new(),
            })
        })
        .op("list changes")?;
    let mut changes = Vec::new();
    for row in rows {
        changes.push(row.op("read change row")?);
    }

    let mut link_stmt = conn
        .prepare(
            "SELECT entity_type, entity_id, field, before_json, after_json
             FROM change_entity_links WHERE change_id = ?1 ORDER BY id",
        )
        .op("list change links")?;
    for change in &mut changes {
        let links = link_stmt
            .query_map(params![change.change_id], |row| {
                Ok(ChangeEntityLink {
                    entity_type: row.get(0)?,
                    entity_id: row.get(1)?,
                    field: row.get(2)?,
                    before: json_column(row, 3)?,
                    after: json_column(row, 4)?,
                })
            })
            .op("list change links")?;
        for link in links {
            change.entities.push(link.op("read change link row")?);
        }
    }
    Ok(changes)
}

// ── Experiment events ──

pub fn insert_event(conn: &Connection, event: &ExperimentEvent) -> AdsOptResult<()> {
    conn.execute(
        "INSERT INTO experiment_events (event_id, experiment_id, event_type, occurred_at, run_id, note)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.event_id,
            event.experiment_id,
            event.event_type.as_str(),
            ts(&event.occurred_at),
            event.run_id,
            event.note,
        ],
    )
    .op("insert event")?;
    Ok(())
}

pub fn list_events_for_experiment(conn: &Connection, experiment_id: &str) -> AdsOptResult<Vec<ExperimentEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT event_id, experiment_id, event_type, occurred_at, run_id, note
             FROM experiment_events WHERE experiment_id = ?1
             ORDER BY occurred_at DESC, event_id DESC",
        )
        .op("list events")?;
    let rows = stmt
        .query_map(params![experiment_id], |row| {
            let raw_type: String = row.get(2)?;
            let event_type = ExperimentEventType::parse(&raw_type)
                .ok_or_else(|| conversion_error(2, format!("unknown event type '{}'", raw_type)))?;
            Ok(ExperimentEvent {
                event_id: row.get(0)?,
                experiment_id: row.get(1)?,
                event_type,
                occurred_at: ts_column(row, 3)?,
                run_id: row.get(4)?,
                note: row.get(5)?,
            })
        })
        .op("list events")?;
    let mut events = Vec::new();
    for row in rows {
        events.push(row.op("read event row")?);
    }
    Ok(events)
}

// ── KIV backlog ──

const KIV_COLUMNS: &str = "kiv_id, account_id, marketplace, asin, title, details, status, created_at,
     resolved_at, source_experiment_id";

fn kiv_from_row(row: &Row<'_>) -> rusqlite::Result<KivItem> {
    let raw_status: String = row.get(6)?;
    let status = KivStatus::parse(&raw_status)
        .ok_or_else(|| conversion_error(6, format!("unknown KIV status '{}'", raw_status)))?;
    Ok(KivItem {
        kiv_id: row.get(0)?,
        account_id: row.get(1)?,
        marketplace: row.get(2)?,
        asin: row.get(3)?,
        title: row.get(4)?,
        details: row.get(5)?,
        status,
        created_at: ts_column(row, 7)?,
        resolved_at: opt_ts_column(row, 8)?,
        source_experiment_id: row.get(9)?,
    })
}

pub fn upsert_kiv_item(conn: &Connection, item: &KivItem) -> AdsOptResult<()> {
    conn.execute(
        "INSERT INTO kiv_items (kiv_id, account_id, marketplace, asin, title, details, status, created_at,
             resolved_at, source_experiment_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(kiv_id) DO UPDATE SET
             title = excluded.title,
             details = excluded.details,
             status = excluded.status,
             resolved_at = excluded.resolved_at",
        params![
            item.kiv_id,
            item.account_id,
            item.marketplace,
            item.asin,
            item.title,
            item.details,
            item.status.as_str(),
            ts(&item.created_at),
            item.resolved_at.as_ref().map(ts),
            item.source_experiment_id,
        ],
    )
    .op("upsert kiv item")?;
    Ok(())
}

pub fn get_kiv_item(conn: &Connection, kiv_id: &str) -> AdsOptResult<Option<KivItem>> {
    match conn.query_row(
        &format!("SELECT {} FROM kiv_items WHERE kiv_id = ?1", KIV_COLUMNS),
        params![kiv_id],
        kiv_from_row,
    ) {
        Ok(item) => Ok(Some(item)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(super::store_error("get kiv item", e)),
    }
}

pub fn list_kiv_items(conn: &Connection, ctx: &ScopeContext, asin: &str) -> AdsOptResult<Vec<KivItem>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM kiv_items
             WHERE account_id = ?1 AND marketplace = ?2 COLLATE NOCASE AND asin = ?3
             ORDER BY created_at DESC, kiv_id",
            KIV_COLUMNS
        ))
        .op("list kiv items")?;
    let rows = stmt
        .query_map(params![ctx.account_id, ctx.marketplace, asin], kiv_from_row)
        .op("list kiv items")?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row.op("read kiv row")?);
    }
    Ok(items)
}

// ── Driver campaign intents ──

pub fn upsert_driver_intent(conn: &Connection, intent: &DriverCampaignIntent) -> AdsOptResult<()> {
    conn.execute(
        "INSERT INTO driver_campaign_intents (account_id, marketplace, asin, campaign_id, intent, notes, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(account_id, marketplace, asin, campaign_id) DO UPDATE SET
             intent = excluded.intent,
             notes = excluded.notes,
             updated_at = excluded.updated_at",
        params![
            intent.account_id,
            intent.marketplace,
            intent.asin,
            intent.campaign_id,
            intent.intent,
            intent.notes,
            ts(&intent.updated_at),
        ],
    )
    .op("upsert driver intent")?;
    Ok(())
}

pub fn list_driver_intents(
    conn: &Connection,
    ctx: &ScopeContext,
    asin: &str,
) -> AdsOptResult<Vec<DriverCampaignIntent>> {
    let mut stmt = conn
        .prepare(
            "SELECT account_id, marketplace, asin, campaign_id, intent, notes, updated_at
             FROM driver_campaign_intents
             WHERE account_id = ?1 AND marketplace = ?2 COLLATE NOCASE AND asin = ?3
             ORDER BY campaign_id",
        )
        .op("list driver intents")?;
    let rows = stmt
        .query_map(params![ctx.account_id, ctx.marketplace, asin], |row| {
            Ok(DriverCampaignIntent {
                account_id: row.get(0)?,
                marketplace: row.get(1)?,
                asin: row.get(2)?,
                campaign_id: row.get(3)?,
                intent: row.get(4)?,
                notes: row.get(5)?,
                updated_at: ts_column(row, 6)?,
            })
        })
        .op("list driver intents")?;
    let mut intents = Vec::new();
    for row in rows {
        intents.push(row.op("read driver intent row")?);
    }
    Ok(intents)
}

// ── Entity catalog ──

pub fn upsert_entity(conn: &Connection, record: &EntityRecord) -> AdsOptResult<()> {
    conn.execute(
        "INSERT INTO entities (kind, entity_id, account_id, marketplace, asin, campaign_id, name)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(kind, entity_id, account_id, marketplace) DO UPDATE SET
             asin = excluded.asin,
             campaign_id = excluded.campaign_id,
             name = excluded.name",
        params![
            record.kind.as_str(),
            record.entity_id,
            record.account_id,
            record.marketplace,
            record.asin,
            record.campaign_id,
            record.name,
        ],
    )
    .op("upsert entity")?;
    Ok(())
}

pub fn lookup_entity(conn: &Connection, kind: EntityKind, entity_id: &str) -> AdsOptResult<Vec<EntityRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT account_id, marketplace, asin, campaign_id, name
             FROM entities WHERE kind = ?1 AND entity_id = ?2
             ORDER BY account_id, marketplace",
        )
        .op("lookup entity")?;
    let rows = stmt
        .query_map(params![kind.as_str(), entity_id], |row| {
            Ok(EntityRecord {
                kind,
                entity_id: entity_id.to_string(),
                account_id: row.get(0)?,
                marketplace: row.get(1)?,
                asin: row.get(2)?,
                campaign_id: row.get(3)?,
                name: row.get(4)?,
            })
        })
        .op("lookup entity")?;
    let mut records = Vec::new();
    for row in rows {
        records.push(row.op("read entity row")?);
    }
    Ok(records)
}

// ── Daily spend aggregates ──

pub fn insert_campaign_spend(
    conn: &Connection,
    ctx: &ScopeContext,
    asin: &str,
    day: NaiveDate,
    row: &CampaignSpendRow,
) -> AdsOptResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO campaign_spend_daily
             (account_id, marketplace, asin, channel, campaign_id, campaign_name, date, spend, sales)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            ctx.account_id,
            ctx.marketplace,
            asin,
            row.channel.as_str(),
            row.campaign_id,
            row.campaign_name,
            date(day),
            row.spend,
            row.sales,
        ],
    )
    .op("insert campaign spend")?;
    Ok(())
}

pub fn insert_target_spend(
    conn: &Connection,
    ctx: &ScopeContext,
    asin: &str,
    day: NaiveDate,
    row: &TargetSpendRow,
) -> AdsOptResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO target_spend_daily
             (account_id, marketplace, asin, campaign_id, ad_group_id, target_id, target_text, date, spend, sales)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            ctx.account_id,
            ctx.marketplace,
            asin,
            row.campaign_id,
            row.ad_group_id,
            row.target_id,
            row.target_text,
            date(day),
            row.spend,
            row.sales,
        ],
    )
    .op("insert target spend")?;
    Ok(())
}

pub fn insert_spend_reconciliation(
    conn: &Connection,
    ctx: &ScopeContext,
    asin: &str,
    day: NaiveDate,
    row: &SpendReconciliationRow,
) -> AdsOptResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO spend_reconciliation_daily
             (account_id, marketplace, asin, date, reported_cost, attributed_spend, advertised_spend,
              brand_attributed_spend)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            ctx.account_id,
            ctx.marketplace,
            asin,
            date(day),
            row.reported_cost,
            row.attributed_spend,
            row.advertised_spend,
            row.brand_attributed_spend,
        ],
    )
    .op("insert spend reconciliation")?;
    Ok(())
}

/// Campaign spend summed over the query's dates, one row per campaign.
pub fn query_campaign_spend(
    conn: &Connection,
    query: &SpendQuery,
    channel: AdChannel,
) -> rusqlite::Result<Vec<CampaignSpendRow>> {
    let mut stmt = conn.prepare(
        "SELECT campaign_id, MAX(campaign_name), SUM(spend), SUM(sales)
         FROM campaign_spend_daily
         WHERE account_id = ?1 AND marketplace = ?2 COLLATE NOCASE AND asin = ?3 AND channel = ?4
           AND date BETWEEN ?5 AND ?6
         GROUP BY campaign_id
         ORDER BY campaign_id",
    )?;
    let rows = stmt.query_map(
        params![
            query.context.account_id,
            query.context.marketplace,
            query.asin,
            channel.as_str(),
            date(query.start),
            date(query.end),
        ],
        |row| {
            Ok(CampaignSpendRow {
                campaign_id: row.get(0)?,
                campaign_name: row.get(1)?,
                channel,
                spend: row.get(2)?,
                sales: row.get(3)?,
            })
        },
    )?;
    rows.collect()
}

pub fn query_target_spend(conn: &Connection, query: &SpendQuery) -> rusqlite::Result<Vec<TargetSpendRow>> {
    let mut stmt = conn.prepare(
        "SELECT target_id, MAX(campaign_id), MAX(ad_group_id), MAX(target_text), SUM(spend), SUM(sales)
         FROM target_spend_daily
         WHERE account_id = ?1 AND marketplace = ?2 COLLATE NOCASE AND asin = ?3
           AND date BETWEEN ?4 AND ?5
         GROUP BY target_id
         ORDER BY target_id",
    )?;
    let rows = stmt.query_map(
        params![
            query.context.account_id,
            query.context.marketplace,
            query.asin,
            date(query.start),
            date(query.end),
        ],
        |row| {
            Ok(TargetSpendRow {
                target_id: row.get(0)?,
                campaign_id: row.get(1)?,
                ad_group_id: row.get(2)?,
                target_text: row.get(3)?,
                spend: row.get(4)?,
                sales: row.get(5)?,
            })
        },
    )?;
    rows.collect()
}

pub fn query_spend_reconciliation(
    conn: &Connection,
    query: &SpendQuery,
) -> rusqlite::Result<SpendReconciliationRow> {
    conn.query_row(
        "SELECT COALESCE(SUM(reported_cost), 0.0), COALESCE(SUM(attributed_spend), 0.0),
                COALESCE(SUM(advertised_spend), 0.0), COALESCE(SUM(brand_attributed_spend), 0.0)
         FROM spend_reconciliation_daily
         WHERE account_id = ?1 AND marketplace = ?2 COLLATE NOCASE AND asin = ?3
           AND date BETWEEN ?4 AND ?5",
        params![
            query.context.account_id,
            query.context.marketplace,
            query.asin,
            date(query.start),
            date(query.end),
        ],
        |row| {
            Ok(SpendReconciliationRow {
                reported_cost: row.get(0)?,
                attributed_spend: row.get(1)?,
                advertised_spend: row.get(2)?,
                brand_attributed_spend: row.get(3)?,
            })
        },
    )
}

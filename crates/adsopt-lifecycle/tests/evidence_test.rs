//! Evidence pack builder: coverage, attribution bridge, chunk diagnostics and
//! completeness policy against an in-process spend source.

use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;

use adsopt_core::config::{CompletenessPolicy, EvidenceConfig};
use adsopt_core::models::{
    AdChannel, CampaignSpendRow, ScopeContext, SpendQuery, SpendReconciliationRow, TargetSpendRow,
};
use adsopt_core::traits::{ChunkFetchError, ChunkResult, ISpendSource};
use adsopt_lifecycle::api::functions::adsopt_evidence_pack;
use adsopt_lifecycle::evidence::{EvidencePackBuilder, EvidenceRequest, MessageLevel, PackStatus};
use adsopt_lifecycle::SqliteRecordStore;

const ASIN: &str = "B0TEST0001";

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn ctx() -> ScopeContext {
    ScopeContext::new("acct-1", "US")
}

fn campaign(id: &str, channel: AdChannel, spend: f64) -> CampaignSpendRow {
    CampaignSpendRow {
        campaign_id: id.to_string(),
        campaign_name: Some(format!("{} campaign", id)),
        channel,
        spend,
        sales: spend * 3.0,
    }
}

fn target(id: &str, campaign_id: &str, spend: f64) -> TargetSpendRow {
    TargetSpendRow {
        target_id: id.to_string(),
        campaign_id: campaign_id.to_string(),
        ad_group_id: Some("ag-1".to_string()),
        target_text: Some(format!("kw {}", id)),
        spend,
        sales: 0.0,
    }
}

/// Spend source serving fixed per-chunk rows, with optional failure rules.
#[derive(Default)]
struct FakeSource {
    sp: Vec<CampaignSpendRow>,
    sb: Vec<CampaignSpendRow>,
    targets: Vec<TargetSpendRow>,
    reconciliation: SpendReconciliationRow,
    fail_sb: Option<ChunkFetchError>,
    /// Fail target fetches for the chunk starting on this date.
    fail_targets_from: Option<NaiveDate>,
}

impl ISpendSource for FakeSource {
    fn campaign_spend(&self, _query: &SpendQuery, channel: AdChannel) -> ChunkResult<Vec<CampaignSpendRow>> {
        match channel {
            AdChannel::Sp => Ok(self.sp.clone()),
            AdChannel::Sb => match &self.fail_sb {
                Some(e) => Err(e.clone()),
                None => Ok(self.sb.clone()),
            },
            AdChannel::Sd => Ok(Vec::new()),
        }
    }

    fn target_spend(&self, query: &SpendQuery) -> ChunkResult<Vec<TargetSpendRow>> {
        if self.fail_targets_from == Some(query.start) {
            return Err(ChunkFetchError::Failed {
                reason: "report unavailable".to_string(),
            });
        }
        Ok(self.targets.clone())
    }

    fn spend_reconciliation(&self, _query: &SpendQuery) -> ChunkResult<SpendReconciliationRow> {
        Ok(self.reconciliation.clone())
    }
}

fn standard_source() -> FakeSource {
    FakeSource {
        sp: vec![
            campaign("c-1", AdChannel::Sp, 900.0),
            campaign("c-2", AdChannel::Sp, 80.0),
            campaign("c-3", AdChannel::Sp, 20.0),
        ],
        targets: vec![target("t-1", "c-1", 500.0), target("t-2", "c-3", 20.0), target("t-3", "c-2", 80.0)],
        reconciliation: SpendReconciliationRow {
            reported_cost: 1200.0,
            attributed_spend: 950.0,
            advertised_spend: 1000.0,
            brand_attributed_spend: 0.0,
        },
        ..Default::default()
    }
}

fn request(range: &str) -> EvidenceRequest {
    EvidenceRequest {
        context: ctx(),
        asin: ASIN.to_string(),
        experiment_id: Some("exp-1".to_string()),
        range: Some(range.to_string()),
        end_date: Some("2026-03-31".to_string()),
    }
}

fn generated_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 1, 9, 0, 0).unwrap()
}

#[test]
fn complete_pack_meets_coverage_and_reports_missing_channels() {
    let builder = EvidencePackBuilder::default();
    let pack = builder
        .build(&request("30d"), &standard_source(), day("2026-04-01"), generated_at())
        .unwrap();

    assert_eq!(pack.status, PackStatus::Complete);
    // 30d looks back 60 days: two 31-day chunks of the same rows.
    assert_eq!(pack.range.start_bound, day("2026-01-31"));
    assert_eq!(pack.range.end_bound, day("2026-03-31"));
    assert_eq!(pack.fetch.chunks_per_batch, 2);
    assert_eq!(pack.fetch.fetches_failed, 0);
    assert_eq!(pack.totals.mapped_spend_total, 2000.0);

    // 1800 alone is below 95% of 2000; 1800 + 160 reaches it.
    let ids: Vec<&str> = pack.campaigns.iter().map(|c| c.campaign_id.as_str()).collect();
    assert_eq!(ids, vec!["c-1", "c-2"]);
    assert_eq!(pack.coverage.campaigns_available, 3);
    assert!((pack.coverage.coverage_pct.unwrap() - 0.98).abs() < 1e-9);

    // Targets are restricted to the selected campaigns.
    assert_eq!(pack.coverage.targets_available, 2);
    assert!(pack.targets.iter().all(|t| t.campaign_id != "c-3"));

    let codes: Vec<&str> = pack.messages.iter().map(|m| m.code.as_str()).collect();
    assert!(codes.contains(&"COVERAGE_SAMPLED"));
    assert!(codes.contains(&"NO_SB_FOR_ASIN"));
    assert!(codes.contains(&"NO_SD_FOR_ASIN"));
    assert!(!codes.contains(&"NO_SP_FOR_ASIN"));

    let bridge = &pack.attribution_bridge;
    assert_eq!(bridge.gap_vs_attributed_total, 500.0);
    // mapped 2000 vs attributed 1900
    assert_eq!(bridge.sp_unattributed_spend_total, 100.0);
    assert_eq!(bridge.attributed_coverage_of_reported, Some(0.791667));
    assert_eq!(bridge.brand_attributed_coverage_of_reported, Some(0.0));
    assert!(pack.pack_id.starts_with("ep_"));
}

#[test]
fn pack_id_ignores_generation_time() {
    let builder = EvidencePackBuilder::default();
    let source = standard_source();
    let a = builder.build(&request("30d"), &source, day("2026-04-01"), generated_at()).unwrap();
    let later = generated_at() + chrono::Duration::hours(5);
    let b = builder.build(&request("30d"), &source, day("2026-04-01"), later).unwrap();
    assert_eq!(a.pack_id, b.pack_id);
}

#[test]
fn channel_that_always_times_out_degrades_the_pack() {
    let source = FakeSource {
        fail_sb: Some(ChunkFetchError::Timeout {
            reason: "statement timeout".to_string(),
        }),
        ..standard_source()
    };
    let pack = EvidencePackBuilder::default()
        .build(&request("60d"), &source, day("2026-04-01"), generated_at())
        .unwrap();

    assert_eq!(pack.status, PackStatus::Degraded);
    assert_eq!(pack.fetch.chunks_per_batch, 2);
    assert_eq!(pack.fetch.fetches_failed, 2);

    let failed: Vec<_> = pack.messages.iter().filter(|m| m.code == "CHUNK_FAILED").collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].level, MessageLevel::Error);
    assert!(failed[0].text.contains("timeouts"));
    // A channel that could not be read is not reported as empty.
    assert!(pack.messages.iter().all(|m| m.code != "NO_SB_FOR_ASIN"));
    assert!(!pack.warnings.is_empty());

    // Two chunks of the same rows sum.
    assert_eq!(pack.totals.mapped_spend_total, 2000.0);
}

#[test]
fn partial_failure_with_required_completeness_is_incomplete() {
    let range_start = day("2026-01-31"); // 60d ending 2026-03-31
    let source = FakeSource {
        fail_targets_from: Some(range_start),
        ..standard_source()
    };
    let config = EvidenceConfig {
        completeness: CompletenessPolicy::RequireComplete,
        ..EvidenceConfig::default()
    };
    let pack = EvidencePackBuilder::new(config)
        .build(&request("60d"), &source, day("2026-04-01"), generated_at())
        .unwrap();

    assert_eq!(pack.range.start_bound, range_start);
    assert_eq!(pack.status, PackStatus::PackIncomplete);
    assert_eq!(pack.fetch.fetches_failed, 1);
    let codes: Vec<&str> = pack.messages.iter().map(|m| m.code.as_str()).collect();
    assert!(codes.contains(&"CHUNK_PARTIAL"));
    assert!(codes.contains(&"PACK_INCOMPLETE"));
}

#[test]
fn empty_asin_is_rejected_before_fetching() {
    let mut req = request("30d");
    req.asin = "  ".to_string();
    let err = EvidencePackBuilder::default()
        .build(&req, &standard_source(), day("2026-04-01"), generated_at())
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[test]
fn api_builds_pack_from_sqlite_spend() {
    let store = SqliteRecordStore::open_in_memory().unwrap();
    for d in ["2026-03-10", "2026-03-11"] {
        store
            .record_campaign_spend(&ctx(), ASIN, day(d), &campaign("c-1", AdChannel::Sp, 40.0))
            .unwrap();
        store
            .record_target_spend(&ctx(), ASIN, day(d), &target("t-1", "c-1", 40.0))
            .unwrap();
        store
            .record_spend_reconciliation(
                &ctx(),
                ASIN,
                day(d),
                &SpendReconciliationRow {
                    reported_cost: 50.0,
                    attributed_spend: 40.0,
                    advertised_spend: 40.0,
                    brand_attributed_spend: 0.0,
                },
            )
            .unwrap();
    }
    // Outside the range.
    store
        .record_campaign_spend(&ctx(), ASIN, day("2026-01-01"), &campaign("c-old", AdChannel::Sp, 999.0))
        .unwrap();

    let body = adsopt_evidence_pack(
        &json!({
            "context": { "account_id": "acct-1", "marketplace": "US" },
            "asin": ASIN,
            "range": "30d",
            "end_date": "2026-03-31"
        }),
        &EvidenceConfig::default(),
        &store,
        generated_at(),
    )
    .unwrap();

    assert_eq!(body["ok"], true);
    assert_eq!(body["filename"], "evidence_B0TEST0001_30d.json");
    assert_eq!(body["pack"]["status"], "complete");
    assert_eq!(body["pack"]["totals"]["mapped_spend_total"], 80.0);
    assert_eq!(body["pack"]["campaigns"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["pack"]["attribution_bridge"]["gap_vs_attributed_total"], 20.0);
}

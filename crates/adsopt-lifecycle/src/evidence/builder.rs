//! EvidencePackBuilder: chunked, parallel spend fetch + coverage selection.
//!
//! Phases:
//! 1. Resolve the bounded range and split it into date chunks
//! 2. Fetch every (batch, chunk) pair in parallel via rayon
//! 3. Aggregate rows per id, count failures per batch
//! 4. Select by coverage, build the attribution bridge, emit diagnostics
//!
//! A failed chunk never aborts the build; it becomes a message and, depending
//! on the completeness policy, a `degraded` or `pack_incomplete` status.

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use adsopt_core::config::{CompletenessPolicy, EvidenceConfig};
use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{
    AdChannel, CampaignSpendRow, DocumentKind, ScopeContext, SpendQuery, SpendReconciliationRow,
    TargetSpendRow,
};
use adsopt_core::traits::{ChunkResult, ISpendSource};

use super::attribution::{build_attribution_bridge, AttributionInputs};
use super::coverage::{effective_spend, select_coverage, top_by_spend, CoverageLimits};
use super::diagnostics::{
    classify_chunk_batch, legacy_warnings, no_rows_for_asin, BatchFlavor, ChunkBatchOutcome,
    MessageLevel, PackMessage,
};
use super::pack::{CoverageSummary, EvidencePack, FetchStats, PackStatus, PackTotals};
use super::range::{compute_bounded_range, BoundedRange, RangeOptions};
use crate::dates::days_after;
use crate::hashing::{content_hash, short_id};

/// What to build a pack for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRequest {
    pub context: ScopeContext,
    pub asin: String,
    #[serde(default)]
    pub experiment_id: Option<String>,
    /// `30d`, `60d`, `90d`, `180d`, `all`, `baseline`.
    #[serde(default)]
    pub range: Option<String>,
    /// `YYYY-MM-DD`; defaults to today.
    #[serde(default)]
    pub end_date: Option<String>,
}

/// One independent fetch stream. Each stream is fetched once per date chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum FetchBatch {
    Campaigns(AdChannel),
    SpTargets,
    Reconciliation,
}

impl FetchBatch {
    const ALL: [FetchBatch; 5] = [
        Self::Campaigns(AdChannel::Sp),
        Self::SpTargets,
        Self::Campaigns(AdChannel::Sb),
        Self::Campaigns(AdChannel::Sd),
        Self::Reconciliation,
    ];

    fn label(&self) -> &'static str {
        match self {
            Self::Campaigns(AdChannel::Sp) => "SP campaigns",
            Self::Campaigns(AdChannel::Sb) => "SB campaigns",
            Self::Campaigns(AdChannel::Sd) => "SD campaigns",
            Self::SpTargets => "SP targets",
            Self::Reconciliation => "Spend reconciliation",
        }
    }

    fn flavor(&self) -> BatchFlavor {
        match self {
            Self::Reconciliation => BatchFlavor::SpendReconciliation,
            _ => BatchFlavor::Labeled,
        }
    }
}

enum FetchPayload {
    Campaigns(Vec<CampaignSpendRow>),
    Targets(Vec<TargetSpendRow>),
    Reconciliation(SpendReconciliationRow),
}

/// Per-batch aggregation state, keyed by id so chunk order never matters.
#[derive(Default)]
struct Aggregates {
    campaigns: BTreeMap<AdChannel, BTreeMap<String, CampaignSpendRow>>,
    targets: BTreeMap<String, TargetSpendRow>,
    reconciliation: SpendReconciliationRow,
    outcomes: BTreeMap<FetchBatch, ChunkBatchOutcome>,
}

impl Aggregates {
    fn absorb(&mut self, batch: FetchBatch, result: ChunkResult<FetchPayload>) {
        let outcome = self
            .outcomes
            .entry(batch)
            .or_insert_with(|| ChunkBatchOutcome::new(batch.label()));
        let payload = match result {
            Ok(payload) => {
                outcome.record_ok();
                payload
            }
            Err(e) => {
                debug!(batch = batch.label(), error = %e, "Chunk fetch failed");
                outcome.record_failure(&e);
                return;
            }
        };

        match payload {
            FetchPayload::Campaigns(rows) => {
                for row in rows {
                    let channel_rows = self.campaigns.entry(row.channel).or_default();
                    match channel_rows.get_mut(&row.campaign_id) {
                        Some(existing) => {
                            existing.spend += effective_spend(row.spend);
                            existing.sales += effective_spend(row.sales);
                            if existing.campaign_name.is_none() {
                                existing.campaign_name = row.campaign_name;
                            }
                        }
                        None => {
                            let mut row = row;
                            row.spend = effective_spend(row.spend);
                            row.sales = effective_spend(row.sales);
                            channel_rows.insert(row.campaign_id.clone(), row);
                        }
                    }
                }
            }
            FetchPayload::Targets(rows) => {
                for row in rows {
                    match self.targets.get_mut(&row.target_id) {
                        Some(existing) => {
                            existing.spend += effective_spend(row.spend);
                            existing.sales += effective_spend(row.sales);
                        }
                        None => {
                            let mut row = row;
                            row.spend = effective_spend(row.spend);
                            row.sales = effective_spend(row.sales);
                            self.targets.insert(row.target_id.clone(), row);
                        }
                    }
                }
            }
            FetchPayload::Reconciliation(r) => {
                self.reconciliation.reported_cost += effective_spend(r.reported_cost);
                self.reconciliation.attributed_spend += effective_spend(r.attributed_spend);
                self.reconciliation.advertised_spend += effective_spend(r.advertised_spend);
                self.reconciliation.brand_attributed_spend +=
                    effective_spend(r.brand_attributed_spend);
            }
        }
    }

    fn campaign_rows(&self, channel: AdChannel) -> Vec<CampaignSpendRow> {
        self.campaigns
            .get(&channel)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    fn outcome(&self, batch: FetchBatch) -> Option<&ChunkBatchOutcome> {
        self.outcomes.get(&batch)
    }
}

/// Builds evidence packs against any `ISpendSource`.
pub struct EvidencePackBuilder {
    config: EvidenceConfig,
}

impl EvidencePackBuilder {
    pub fn new(config: EvidenceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvidenceConfig {
        &self.config
    }

    /// Build one pack. Fails only on an unusable request; data failures are
    /// reported inside the pack.
    pub fn build(
        &self,
        request: &EvidenceRequest,
        source: &dyn ISpendSource,
        today: NaiveDate,
        generated_at: DateTime<Utc>,
    ) -> AdsOptResult<EvidencePack> {
        let asin = request.asin.trim();
        if asin.is_empty() {
            return Err(AdsOptError::input_shape("asin must not be empty"));
        }

        // Phase 1: range + chunks
        let range = compute_bounded_range(
            request.range.as_deref(),
            request.end_date.as_deref(),
            &RangeOptions::from(&self.config),
            today,
        );
        let chunks = split_into_chunks(&range, self.config.chunk_days);

        // Phase 2: parallel fetch
        let fetch_start = Instant::now();
        let queries: Vec<(FetchBatch, SpendQuery)> = FetchBatch::ALL
            .iter()
            .flat_map(|batch| {
                chunks.iter().map(move |(start, end)| {
                    (
                        *batch,
                        SpendQuery {
                            context: request.context.clone(),
                            asin: asin.to_string(),
                            start: *start,
                            end: *end,
                        },
                    )
                })
            })
            .collect();
        let results = self.fetch_all(source, &queries);
        let fetch_ms = fetch_start.elapsed().as_millis() as u64;

        // Phase 3: aggregate
        let mut agg = Aggregates::default();
        for (batch, result) in results {
            agg.absorb(batch, result);
        }

        // Phase 4: select + diagnose
        let sp_campaigns = agg.campaign_rows(AdChannel::Sp);
        let sb_rows = agg.campaign_rows(AdChannel::Sb);
        let sd_rows = agg.campaign_rows(AdChannel::Sd);
        let targets: Vec<TargetSpendRow> = agg.targets.values().cloned().collect();

        let mapped_spend_total: f64 = sp_campaigns.iter().map(|c| c.spend).sum();
        let limits = CoverageLimits::from(&self.config);
        let selection = select_coverage(mapped_spend_total, &sp_campaigns, &targets, &limits);

        let bridge = build_attribution_bridge(&AttributionInputs {
            reported_cost: agg.reconciliation.reported_cost,
            attributed_spend: agg.reconciliation.attributed_spend,
            advertised_spend: agg.reconciliation.advertised_spend,
            mapped_campaign_spend: mapped_spend_total,
            brand_attributed_spend: agg.reconciliation.brand_attributed_spend,
        });

        let mut messages = Vec::new();
        let mut failed_total = 0;
        for batch in FetchBatch::ALL {
            let Some(outcome) = agg.outcome(batch) else {
                continue;
            };
            failed_total += outcome.failed;
            if let Some(message) = classify_chunk_batch(outcome, batch.flavor()) {
                messages.push(message);
            }
        }
        for (channel, rows) in [
            (AdChannel::Sp, &sp_campaigns),
            (AdChannel::Sb, &sb_rows),
            (AdChannel::Sd, &sd_rows),
        ] {
            let fully_failed = agg
                .outcome(FetchBatch::Campaigns(channel))
                .is_some_and(ChunkBatchOutcome::all_failed);
            if rows.is_empty() && !fully_failed {
                messages.push(no_rows_for_asin(channel, asin));
            }
        }
        if selection.campaigns_truncated() {
            messages.push(PackMessage::new(
                MessageLevel::Info,
                "COVERAGE_SAMPLED",
                format!(
                    "Showing {} of {} SP campaigns{}.",
                    selection.campaigns.len(),
                    selection.campaigns_available,
                    selection
                        .coverage_pct
                        .map(|p| format!(", covering {:.1}% of mapped spend", p * 100.0))
                        .unwrap_or_default()
                ),
            ));
        }

        let status = match (failed_total, self.config.completeness) {
            (0, _) => PackStatus::Complete,
            (_, CompletenessPolicy::BestEffort) => PackStatus::Degraded,
            (_, CompletenessPolicy::RequireComplete) => {
                messages.push(PackMessage::new(
                    MessageLevel::Error,
                    "PACK_INCOMPLETE",
                    format!(
                        "{} of {} fetches failed and a complete pack was required; do not base decisions on this pack.",
                        failed_total,
                        queries.len()
                    ),
                ));
                PackStatus::PackIncomplete
            }
        };

        let totals = PackTotals {
            mapped_spend_total,
            sp_sales_total: sp_campaigns.iter().map(|c| c.sales).sum(),
            sb_spend_total: sb_rows.iter().map(|c| c.spend).sum(),
            sd_spend_total: sd_rows.iter().map(|c| c.spend).sum(),
        };
        let coverage = CoverageSummary {
            threshold: limits.coverage_threshold,
            campaign_limit: limits.campaign_limit,
            target_limit: limits.target_limit,
            campaigns_selected: selection.campaigns.len(),
            campaigns_available: selection.campaigns_available,
            targets_selected: selection.targets.len(),
            targets_available: selection.targets_available,
            campaign_spend_included: selection.campaign_spend_included,
            target_spend_included: selection.target_spend_included,
            coverage_pct: selection.coverage_pct,
            target_coverage_pct: selection.target_coverage_pct,
        };

        let sb_campaigns = top_by_spend(&sb_rows, limits.campaign_limit);
        let sd_campaigns = top_by_spend(&sd_rows, limits.campaign_limit);

        let pack_id = short_id(
            "ep",
            &content_hash(&PackIdentity {
                context: &request.context,
                asin,
                range: &range,
                status,
                campaigns: &selection.campaigns,
                targets: &selection.targets,
                sb_campaigns: &sb_campaigns,
                sd_campaigns: &sd_campaigns,
                mapped_spend_total,
                reconciliation: &agg.reconciliation,
            })?,
        );

        if failed_total > 0 {
            warn!(
                asin,
                pack_id = %pack_id,
                failed = failed_total,
                fetches = queries.len(),
                status = ?status,
                "Evidence pack built with failed chunks"
            );
        }
        info!(
            asin,
            pack_id = %pack_id,
            range = range.range.as_str(),
            chunks = chunks.len(),
            campaigns = selection.campaigns.len(),
            targets = selection.targets.len(),
            fetch_ms,
            "Evidence pack built"
        );

        Ok(EvidencePack {
            kind: DocumentKind::EvidencePack,
            pack_id,
            experiment_id: request.experiment_id.clone(),
            context: request.context.clone(),
            asin: asin.to_string(),
            range,
            status,
            totals,
            coverage,
            campaigns: selection.campaigns,
            targets: selection.targets,
            sb_campaigns,
            sd_campaigns,
            attribution_bridge: bridge,
            warnings: legacy_warnings(&messages),
            messages,
            fetch: FetchStats {
                chunks_per_batch: chunks.len(),
                fetches_total: queries.len(),
                fetches_failed: failed_total,
            },
            generated_at,
        })
    }

    fn fetch_all(
        &self,
        source: &dyn ISpendSource,
        queries: &[(FetchBatch, SpendQuery)],
    ) -> Vec<(FetchBatch, ChunkResult<FetchPayload>)> {
        let run = || {
            queries
                .par_iter()
                .map(|(batch, query)| (*batch, fetch_one(source, *batch, query)))
                .collect::<Vec<_>>()
        };

        if self.config.max_parallel_fetches == 0 {
            return run();
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_parallel_fetches)
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!(error = %e, "Could not build fetch pool; using the global rayon pool");
                run()
            }
        }
    }
}

impl Default for EvidencePackBuilder {
    fn default() -> Self {
        Self::new(EvidenceConfig::default())
    }
}

fn fetch_one(
    source: &dyn ISpendSource,
    batch: FetchBatch,
    query: &SpendQuery,
) -> ChunkResult<FetchPayload> {
    match batch {
        FetchBatch::Campaigns(channel) => source
            .campaign_spend(query, channel)
            .map(|rows| {
                // A source may return rows for other channels; keep the stream pure.
                FetchPayload::Campaigns(rows.into_iter().filter(|r| r.channel == channel).collect())
            }),
        FetchBatch::SpTargets => source.target_spend(query).map(FetchPayload::Targets),
        FetchBatch::Reconciliation => source
            .spend_reconciliation(query)
            .map(FetchPayload::Reconciliation),
    }
}

/// Consecutive inclusive chunks of at most `chunk_days` days covering the range.
pub fn split_into_chunks(range: &BoundedRange, chunk_days: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let step = u64::from(chunk_days.max(1));
    let mut chunks = Vec::new();
    let mut start = range.start_bound;
    while start <= range.end_bound {
        let end = days_after(start, step - 1).min(range.end_bound);
        chunks.push((start, end));
        if end == range.end_bound {
            break;
        }
        start = days_after(end, 1);
    }
    chunks
}

/// Fields that determine a pack's id. `generated_at` is deliberately absent.
#[derive(Serialize)]
struct PackIdentity<'a> {
    context: &'a ScopeContext,
    asin: &'a str,
    range: &'a BoundedRange,
    status: PackStatus,
    campaigns: &'a [CampaignSpendRow],
    targets: &'a [TargetSpendRow],
    sb_campaigns: &'a [CampaignSpendRow],
    sd_campaigns: &'a [CampaignSpendRow],
    mapped_spend_total: f64,
    reconciliation: &'a SpendReconciliationRow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::range::RangeKeyword;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn chunks_cover_range_exactly() {
        let range = BoundedRange {
            range: RangeKeyword::Last60,
            start_bound: date("2025-12-22"),
            end_bound: date("2026-02-19"),
            lookback_days: 60,
        };
        let chunks = split_into_chunks(&range, 31);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], (date("2025-12-22"), date("2026-01-21")));
        assert_eq!(chunks[1], (date("2026-01-22"), date("2026-02-19")));

        let single = split_into_chunks(&range, 365);
        assert_eq!(single, vec![(range.start_bound, range.end_bound)]);
    }
}

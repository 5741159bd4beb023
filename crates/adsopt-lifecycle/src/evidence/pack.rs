//! The evidence pack document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsopt_core::models::{CampaignSpendRow, DocumentKind, ScopeContext, TargetSpendRow};

use super::attribution::AttributionBridge;
use super::diagnostics::PackMessage;
use super::range::BoundedRange;

/// Overall completeness of a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackStatus {
    /// Every chunk fetch succeeded.
    Complete,
    /// Some fetches failed; the pack holds whatever succeeded.
    Degraded,
    /// Some fetches failed and completeness was required.
    PackIncomplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub threshold: f64,
    pub campaign_limit: usize,
    pub target_limit: usize,
    pub campaigns_selected: usize,
    pub campaigns_available: usize,
    pub targets_selected: usize,
    pub targets_available: usize,
    pub campaign_spend_included: f64,
    pub target_spend_included: f64,
    pub coverage_pct: Option<f64>,
    pub target_coverage_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackTotals {
    /// Sum of Sponsored Products campaign spend; the coverage denominator.
    pub mapped_spend_total: f64,
    pub sp_sales_total: f64,
    pub sb_spend_total: f64,
    pub sd_spend_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchStats {
    pub chunks_per_batch: usize,
    pub fetches_total: usize,
    pub fetches_failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePack {
    pub kind: DocumentKind,
    /// Content id: identical inputs and data give identical ids.
    pub pack_id: String,
    #[serde(default)]
    pub experiment_id: Option<String>,
    pub context: ScopeContext,
    pub asin: String,
    pub range: BoundedRange,
    pub status: PackStatus,
    pub totals: PackTotals,
    pub coverage: CoverageSummary,
    pub campaigns: Vec<CampaignSpendRow>,
    pub targets: Vec<TargetSpendRow>,
    pub sb_campaigns: Vec<CampaignSpendRow>,
    pub sd_campaigns: Vec<CampaignSpendRow>,
    pub attribution_bridge: AttributionBridge,
    pub messages: Vec<PackMessage>,
    /// Legacy plain-string view of warn/error messages.
    pub warnings: Vec<String>,
    pub fetch: FetchStats,
    pub generated_at: DateTime<Utc>,
}

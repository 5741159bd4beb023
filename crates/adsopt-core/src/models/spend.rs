//! Spend aggregate rows served by a `ISpendSource`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{AdChannel, ScopeContext};

/// Spend for one campaign over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpendRow {
    pub campaign_id: String,
    #[serde(default)]
    pub campaign_name: Option<String>,
    pub channel: AdChannel,
    pub spend: f64,
    #[serde(default)]
    pub sales: f64,
}

/// Spend for one target (keyword / product target) over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSpendRow {
    pub target_id: String,
    pub campaign_id: String,
    #[serde(default)]
    pub ad_group_id: Option<String>,
    #[serde(default)]
    pub target_text: Option<String>,
    pub spend: f64,
    #[serde(default)]
    pub sales: f64,
}

/// Spend figures for one ASIN as reported by independent attribution sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpendReconciliationRow {
    /// Total cost from the ads console report.
    pub reported_cost: f64,
    /// Spend attributed to the ASIN by the attribution report.
    pub attributed_spend: f64,
    /// Spend from the advertised-product report.
    pub advertised_spend: f64,
    /// Sponsored Brands spend attributed to the ASIN.
    pub brand_attributed_spend: f64,
}

/// Scope and date range of one chunk fetch (both ends inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendQuery {
    pub context: ScopeContext,
    pub asin: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

//! Proposal plans: one per channel + run, holding ordered field-level actions.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Advertising channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdChannel {
    /// Sponsored Products.
    #[serde(alias = "SP")]
    Sp,
    /// Sponsored Brands.
    #[serde(alias = "SB")]
    Sb,
    /// Sponsored Display.
    #[serde(alias = "SD")]
    Sd,
}

impl AdChannel {
    pub const ALL: [AdChannel; 3] = [Self::Sp, Self::Sb, Self::Sd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sp => "sp",
            Self::Sb => "sb",
            Self::Sd => "sd",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sp" => Some(Self::Sp),
            "sb" => Some(Self::Sb),
            "sd" => Some(Self::Sd),
            _ => None,
        }
    }
}

impl fmt::Display for AdChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic field mutation proposed against a campaign entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanAction {
    /// Identifier review decisions refer to.
    #[serde(alias = "change_id")]
    pub action_id: String,
    /// e.g. `update_bid`, `pause_target`, `update_budget`.
    pub action_type: String,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub ad_group_id: Option<String>,
    #[serde(default)]
    pub target_id: Option<String>,
    /// Field being changed, e.g. `bid`, `state`, `daily_budget`.
    pub field: String,
    #[serde(default)]
    pub before: Value,
    pub after: Value,
    #[serde(default)]
    pub rationale: Option<String>,
}

/// Proposal plan for one channel + run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkgenPlan {
    pub channel: AdChannel,
    pub run_id: String,
    #[serde(default)]
    pub actions: Vec<PlanAction>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl BulkgenPlan {
    /// Stable key used to order and group plans.
    pub fn plan_key(&self) -> (AdChannel, &str) {
        (self.channel, self.run_id.as_str())
    }
}

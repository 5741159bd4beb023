use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The seller's stated intent for one campaign driving an ASIN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverCampaignIntent {
    pub account_id: String,
    pub marketplace: String,
    pub asin: String,
    pub campaign_id: String,
    /// e.g. `scale`, `defend`, `harvest`, `pause`.
    pub intent: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub updated_at: DateTime<Utc>,
}

//! KIV ("keep in view") backlog items carried between experiments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KivStatus {
    Open,
    Done,
    Dismissed,
}

impl KivStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Done => "done",
            Self::Dismissed => "dismissed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Some(Self::Open),
            "done" => Some(Self::Done),
            "dismissed" => Some(Self::Dismissed),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KivItem {
    pub kiv_id: String,
    pub account_id: String,
    pub marketplace: String,
    pub asin: String,
    pub title: String,
    #[serde(default)]
    pub details: Option<String>,
    pub status: KivStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_experiment_id: Option<String>,
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kinds of entity an inbound document can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Campaign,
    AdGroup,
    Target,
    Product,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Campaign => "campaign",
            Self::AdGroup => "ad_group",
            Self::Target => "target",
            Self::Product => "product",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "campaign" => Some(Self::Campaign),
            "ad_group" => Some(Self::AdGroup),
            "target" => Some(Self::Target),
            "product" => Some(Self::Product),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One known entity and the account/marketplace that owns it.
///
/// The same id can appear under several scopes (an ASIN is listed per
/// marketplace), so lookups return every matching record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub entity_id: String,
    pub account_id: String,
    pub marketplace: String,
    #[serde(default)]
    pub asin: Option<String>,
    #[serde(default)]
    pub campaign_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

//! Direct writes to the per-ASIN backlog: KIV items and driver campaign intents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{DriverCampaignIntent, KivItem, KivStatus, ScopeContext};
use adsopt_core::traits::IRecordStore;

use crate::validation::SemanticGate;

/// A KIV item as submitted by a caller. Without `kiv_id` a new item is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KivItemInput {
    #[serde(default)]
    pub kiv_id: Option<String>,
    pub asin: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    /// `open`, `done` or `dismissed`; case-insensitive. Defaults to `open`.
    #[serde(default)]
    pub status: Option<String>,
}

pub fn upsert_kiv_item(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    input: &KivItemInput,
    now: DateTime<Utc>,
) -> AdsOptResult<KivItem> {
    let asin = input.asin.trim();
    if asin.is_empty() {
        return Err(AdsOptError::input_shape("asin is required"));
    }
    let status = match input.status.as_deref() {
        None => None,
        Some(raw) => Some(KivStatus::parse(raw).ok_or_else(|| {
            AdsOptError::input_shape(format!("unknown KIV status '{}'; expected open, done or dismissed", raw))
        })?),
    };
    let title = input.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let kiv_id = input.kiv_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
    if kiv_id.is_none() && title.is_none() {
        return Err(AdsOptError::input_shape("a new KIV item needs a title"));
    }

    SemanticGate::new(store, ctx).validate_backlog_write(asin, None, kiv_id)?;

    let item = match kiv_id {
        Some(id) => {
            let mut item = store.get_kiv_item(id)?.ok_or_else(|| {
                AdsOptError::store("upsert kiv item", format!("KIV item '{}' vanished after validation", id))
            })?;
            if let Some(title) = title {
                item.title = title.to_string();
            }
            if input.details.is_some() {
                item.details = input.details.clone();
            }
            if let Some(status) = status {
                match (item.status.is_closed(), status.is_closed()) {
                    (false, true) => item.resolved_at = Some(now),
                    (true, false) => item.resolved_at = None,
                    _ => {}
                }
                item.status = status;
            }
            item
        }
        None => {
            let status = status.unwrap_or(KivStatus::Open);
            KivItem {
                kiv_id: Uuid::new_v4().to_string(),
                account_id: ctx.account_id.clone(),
                marketplace: ctx.marketplace.clone(),
                asin: asin.to_string(),
                title: title.unwrap_or_default().to_string(),
                details: input.details.clone(),
                status,
                created_at: now,
                resolved_at: status.is_closed().then_some(now),
                source_experiment_id: None,
            }
        }
    };

    store.upsert_kiv_item(&item)?;
    info!(kiv_id = %item.kiv_id, asin, status = item.status.as_str(), "KIV item saved");
    Ok(item)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverIntentInput {
    pub asin: String,
    pub campaign_id: String,
    pub intent: String,
    #[serde(default)]
    pub notes: Option<String>,
}

pub fn upsert_driver_intent(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    input: &DriverIntentInput,
    now: DateTime<Utc>,
) -> AdsOptResult<DriverCampaignIntent> {
    let asin = input.asin.trim();
    let campaign_id = input.campaign_id.trim();
    let intent = input.intent.trim();
    if asin.is_empty() || campaign_id.is_empty() || intent.is_empty() {
        return Err(AdsOptError::input_shape("asin, campaign_id and intent are required"));
    }

    SemanticGate::new(store, ctx).validate_backlog_write(asin, Some(campaign_id), None)?;

    let record = DriverCampaignIntent {
        account_id: ctx.account_id.clone(),
        marketplace: ctx.marketplace.clone(),
        asin: asin.to_string(),
        campaign_id: campaign_id.to_string(),
        intent: intent.to_ascii_lowercase(),
        notes: input.notes.clone().filter(|n| !n.trim().is_empty()),
        updated_at: now,
    };
    store.upsert_driver_intent(&record)?;
    info!(asin, campaign_id, intent = %record.intent, "Driver intent saved");
    Ok(record)
}

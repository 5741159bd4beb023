//! Experiment event recording.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use adsopt_core::errors::{AdsOptError, AdsOptResult};
use adsopt_core::models::{ExperimentEvent, ExperimentEventType, ScopeContext};
use adsopt_core::traits::IRecordStore;

use crate::experiments::load_experiment;

/// An event as submitted by a caller, before type and timestamp are checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInput {
    pub experiment_id: String,
    pub event_type: String,
    /// RFC 3339; defaults to now.
    #[serde(default)]
    pub occurred_at: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

pub fn record_experiment_event(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    input: &EventInput,
    now: DateTime<Utc>,
) -> AdsOptResult<ExperimentEvent> {
    let event_type = ExperimentEventType::parse(input.event_type.trim()).ok_or_else(|| {
        let allowed: Vec<&str> = ExperimentEventType::ALL.iter().map(|t| t.as_str()).collect();
        AdsOptError::input_shape(format!(
            "unknown event_type '{}'; expected one of {}",
            input.event_type,
            allowed.join(", ")
        ))
    })?;
    let occurred_at = match input.occurred_at.as_deref() {
        None => now,
        Some(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| AdsOptError::input_shape(format!("occurred_at '{}' is not RFC 3339: {}", s, e)))?,
    };

    load_experiment(store, ctx, &input.experiment_id)?;

    let event = ExperimentEvent {
        event_id: Uuid::new_v4().to_string(),
        experiment_id: input.experiment_id.clone(),
        event_type,
        occurred_at,
        run_id: input.run_id.clone().filter(|r| !r.trim().is_empty()),
        note: input.note.clone(),
    };
    store.insert_event(&event)?;
    info!(
        experiment_id = %event.experiment_id,
        event_type = %event.event_type,
        interruption = event_type.is_interruption(),
        "Experiment event recorded"
    );
    Ok(event)
}

//! Rollback pack: the before/after values of an experiment's committed changes,
//! newest first, so a bulksheet can restore the `before` values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use adsopt_core::models::{ChangeLogEntry, DocumentKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackItem {
    pub change_id: String,
    #[serde(default)]
    pub run_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub channel: String,
    pub entity_type: String,
    pub entity_id: String,
    #[serde(default)]
    pub field: Option<String>,
    /// The value currently live (the change's `after`).
    pub current_value: Value,
    /// The value to restore (the change's `before`).
    pub revert_to: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollbackPack {
    pub kind: DocumentKind,
    pub experiment_id: String,
    #[serde(default)]
    pub run_id: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<RollbackItem>,
    /// Changes with no entity links; nothing to revert mechanically.
    pub skipped_change_ids: Vec<String>,
}

/// Build a rollback pack from the experiment's changes, optionally limited to one run.
pub fn build_rollback_pack(
    experiment_id: &str,
    changes: &[ChangeLogEntry],
    run_id: Option<&str>,
    generated_at: DateTime<Utc>,
) -> RollbackPack {
    let mut selected: Vec<&ChangeLogEntry> = changes
        .iter()
        .filter(|c| run_id.map_or(true, |r| c.run_id.as_deref() == Some(r)))
        .collect();
    selected.sort_by(|a, b| {
        b.occurred_at
            .cmp(&a.occurred_at)
            .then_with(|| b.change_id.cmp(&a.change_id))
    });

    let mut items = Vec::new();
    let mut skipped_change_ids = Vec::new();
    for change in selected {
        if change.entities.is_empty() {
            skipped_change_ids.push(change.change_id.clone());
            continue;
        }
        items.extend(change.entities.iter().map(|link| RollbackItem {
            change_id: change.change_id.clone(),
            run_id: change.run_id.clone(),
            occurred_at: change.occurred_at,
            channel: change.channel.clone(),
            entity_type: link.entity_type.clone(),
            entity_id: link.entity_id.clone(),
            field: link.field.clone(),
            current_value: link.after.clone(),
            revert_to: link.before.clone(),
        }));
    }

    RollbackPack {
        kind: DocumentKind::RollbackPack,
        experiment_id: experiment_id.to_string(),
        run_id: run_id.map(String::from),
        generated_at,
        items,
        skipped_change_ids,
    }
}

//! Interruption-aware action timeline.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adsopt_core::models::{ChangeLogEntry, ExperimentEvent};

/// Change types that interrupt a run. Exact match only.
pub const INTERRUPTION_TYPES: [&str; 4] =
    ["guardrail_breach", "manual_intervention", "stop_loss", "rollback"];

pub fn is_interruption_type(change_type: &str) -> bool {
    INTERRUPTION_TYPES.contains(&change_type)
}

/// Newest first; equal timestamps by change id descending.
fn newest_first(a: &ChangeLogEntry, b: &ChangeLogEntry) -> Ordering {
    b.occurred_at
        .cmp(&a.occurred_at)
        .then_with(|| b.change_id.cmp(&a.change_id))
}

/// The `limit` most recent change ids, followed by every interruption change
/// that did not make the cut. Interruptions are never truncated away.
pub fn pick_major_actions(changes: &[ChangeLogEntry], limit: usize) -> Vec<String> {
    let mut sorted: Vec<&ChangeLogEntry> = changes.iter().collect();
    sorted.sort_by(|a, b| newest_first(a, b));

    let mut seen = HashSet::new();
    let mut picked = Vec::new();
    for change in sorted.iter().take(limit) {
        if seen.insert(change.change_id.as_str()) {
            picked.push(change.change_id.clone());
        }
    }
    for change in &sorted {
        if is_interruption_type(&change.change_type) && seen.insert(change.change_id.as_str()) {
            picked.push(change.change_id.clone());
        }
    }
    picked
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineSource {
    Change,
    Event,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub source: TimelineSource,
    pub id: String,
    /// Change type or event type.
    pub label: String,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    pub interruption: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub major_action_ids: Vec<String>,
    pub interruption_count: usize,
}

/// Major changes and all experiment events in one newest-first list.
pub fn derive_timeline(changes: &[ChangeLogEntry], events: &[ExperimentEvent], limit: usize) -> Timeline {
    let major_action_ids = pick_major_actions(changes, limit);
    let major: HashSet<&str> = major_action_ids.iter().map(String::as_str).collect();

    let mut entries: Vec<TimelineEntry> = changes
        .iter()
        .filter(|c| major.contains(c.change_id.as_str()))
        .map(|c| TimelineEntry {
            at: c.occurred_at,
            source: TimelineSource::Change,
            id: c.change_id.clone(),
            label: c.change_type.clone(),
            run_id: c.run_id.clone(),
            summary: c.summary.clone(),
            interruption: is_interruption_type(&c.change_type),
        })
        .collect();
    entries.extend(events.iter().map(|e| TimelineEntry {
        at: e.occurred_at,
        source: TimelineSource::Event,
        id: e.event_id.clone(),
        label: e.event_type.as_str().to_string(),
        run_id: e.run_id.clone(),
        summary: e.note.clone(),
        interruption: e.event_type.is_interruption(),
    }));
    entries.sort_by(|a, b| b.at.cmp(&a.at).then_with(|| b.id.cmp(&a.id)));

    // A change id can appear twice in the log; show it once.
    let mut shown = HashSet::new();
    entries.retain(|e| e.source == TimelineSource::Event || shown.insert(e.id.clone()));

    let interruption_count = entries.iter().filter(|e| e.interruption).count();
    Timeline {
        entries,
        major_action_ids,
        interruption_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsopt_core::models::ExperimentEventType;
    use chrono::TimeZone;

    fn change(id: &str, hour: u32, change_type: &str) -> ChangeLogEntry {
        ChangeLogEntry {
            change_id: id.into(),
            account_id: "acct".into(),
            marketplace: "US".into(),
            occurred_at: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
            channel: "sp".into(),
            change_type: change_type.into(),
            summary: None,
            validated_snapshot_date: None,
            experiment_id: Some("e1".into()),
            run_id: None,
            entities: vec![],
        }
    }

    #[test]
    fn exact_match_only() {
        assert!(is_interruption_type("stop_loss"));
        assert!(!is_interruption_type("stop_loss_v2"));
        assert!(!is_interruption_type("Rollback"));
        assert!(!is_interruption_type("uploaded_to_amazon"));
    }

    #[test]
    fn old_interruptions_survive_the_limit() {
        let changes = vec![
            change("c1", 1, "rollback"),
            change("c2", 2, "update_bid"),
            change("c3", 3, "update_bid"),
            change("c4", 4, "update_bid"),
            change("c0", 0, "guardrail_breach"),
        ];
        let picked = pick_major_actions(&changes, 2);
        assert_eq!(picked, vec!["c4", "c3", "c1", "c0"]);
    }

    #[test]
    fn ties_break_by_change_id_descending() {
        let changes = vec![change("a", 5, "x"), change("b", 5, "x"), change("c", 5, "x")];
        assert_eq!(pick_major_actions(&changes, 2), vec!["c", "b"]);
    }

    #[test]
    fn interruption_inside_limit_is_not_duplicated() {
        let changes = vec![change("c1", 1, "stop_loss"), change("c2", 2, "x")];
        assert_eq!(pick_major_actions(&changes, 5), vec!["c2", "c1"]);
    }

    #[test]
    fn timeline_merges_events() {
        let changes = vec![change("c1", 1, "update_bid"), change("c2", 3, "stop_loss")];
        let events = vec![ExperimentEvent {
            event_id: "ev1".into(),
            experiment_id: "e1".into(),
            event_type: ExperimentEventType::ManualIntervention,
            occurred_at: Utc.with_ymd_and_hms(2026, 3, 1, 2, 0, 0).unwrap(),
            run_id: None,
            note: Some("paused by hand".into()),
        }];
        let timeline = derive_timeline(&changes, &events, 10);
        let ids: Vec<_> = timeline.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["c2", "ev1", "c1"]);
        assert_eq!(timeline.interruption_count, 2);
    }
}

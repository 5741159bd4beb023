//! Evaluation date window derivation.
//!
//! Tiers, first hit wins:
//! 1. `scope.start_date` + `scope.end_date`, both valid calendar dates
//! 2. min/max `validated_snapshot_date` of linked changes
//! 3. min/max calendar date of linked changes' `occurred_at`
//! 4. missing

use chrono::NaiveDate;
use serde_json::Value;

use adsopt_core::models::{ChangeLogEntry, DateWindow, DateWindowSource};

use crate::dates::parse_calendar_date;

pub fn derive_experiment_date_window(scope: &Value, changes: &[ChangeLogEntry]) -> DateWindow {
    let scope_date = |key: &str| scope.get(key).and_then(Value::as_str).and_then(parse_calendar_date);
    if let (Some(start), Some(end)) = (scope_date("start_date"), scope_date("end_date")) {
        return DateWindow {
            start: Some(start),
            end: Some(end),
            source: DateWindowSource::Scope,
        };
    }

    let snapshots = changes
        .iter()
        .filter_map(|c| c.validated_snapshot_date.as_deref().and_then(parse_calendar_date));
    if let Some(window) = span(snapshots, DateWindowSource::ValidatedSnapshot) {
        return window;
    }

    let occurred = changes.iter().map(|c| c.occurred_at.date_naive());
    span(occurred, DateWindowSource::OccurredAt).unwrap_or_else(DateWindow::missing)
}

fn span(dates: impl Iterator<Item = NaiveDate>, source: DateWindowSource) -> Option<DateWindow> {
    let (min, max) = dates.fold(None, |acc: Option<(NaiveDate, NaiveDate)>, d| match acc {
        None => Some((d, d)),
        Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
    })?;
    Some(DateWindow {
        start: Some(min),
        end: Some(max),
        source,
    })
}

//! Bounded range resolution for evidence packs.
//!
//! Lookbacks (each keyword keeps a margin past its nominal window):
//! - 30d, 60d, baseline (and anything unrecognized): 60 days
//! - 90d: 120 days
//! - 180d: 210 days
//! - all: the configured cap (365), or 100,000 days when unbounded
//!
//! `start = end − lookback + 1`, so a range covers exactly `lookback` days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use adsopt_core::config::EvidenceConfig;

use crate::dates::{days_before, parse_calendar_date};

/// Lookback used when `all` is allowed to be unbounded.
pub const UNBOUNDED_LOOKBACK_DAYS: u32 = 100_000;

/// Lookback of the `baseline` keyword and of unrecognized keywords.
pub const BASELINE_LOOKBACK_DAYS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeKeyword {
    #[serde(rename = "30d")]
    Last30,
    #[serde(rename = "60d")]
    Last60,
    #[serde(rename = "90d")]
    Last90,
    #[serde(rename = "180d")]
    Last180,
    #[serde(rename = "all")]
    All,
    #[serde(rename = "baseline")]
    Baseline,
}

impl RangeKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Last30 => "30d",
            Self::Last60 => "60d",
            Self::Last90 => "90d",
            Self::Last180 => "180d",
            Self::All => "all",
            Self::Baseline => "baseline",
        }
    }

    /// Unknown or missing keywords resolve as `baseline`.
    pub fn parse_or_baseline(s: Option<&str>) -> Self {
        match s.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("30d") => Self::Last30,
            Some("60d") => Self::Last60,
            Some("90d") => Self::Last90,
            Some("180d") => Self::Last180,
            Some("all") => Self::All,
            _ => Self::Baseline,
        }
    }
}

/// How `all` is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOptions {
    pub all_cap_days: u32,
    pub unbounded_all: bool,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            all_cap_days: 365,
            unbounded_all: false,
        }
    }
}

impl From<&EvidenceConfig> for RangeOptions {
    fn from(config: &EvidenceConfig) -> Self {
        Self {
            all_cap_days: config.all_range_cap_days,
            unbounded_all: config.allow_unbounded_all,
        }
    }
}

/// A resolved, inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundedRange {
    pub range: RangeKeyword,
    pub start_bound: NaiveDate,
    pub end_bound: NaiveDate,
    pub lookback_days: u32,
}

impl BoundedRange {
    /// Number of calendar days covered, both ends inclusive.
    pub fn day_count(&self) -> i64 {
        (self.end_bound - self.start_bound).num_days() + 1
    }
}

pub fn lookback_days(keyword: RangeKeyword, options: &RangeOptions) -> u32 {
    match keyword {
        RangeKeyword::Last30 => 60,
        RangeKeyword::Last60 => 60,
        RangeKeyword::Last90 => 120,
        RangeKeyword::Last180 => 210,
        RangeKeyword::All if options.unbounded_all => UNBOUNDED_LOOKBACK_DAYS,
        RangeKeyword::All => options.all_cap_days.max(1),
        RangeKeyword::Baseline => BASELINE_LOOKBACK_DAYS,
    }
}

/// Resolve a requested keyword and optional end date into concrete bounds.
///
/// `end_date` is used when it is a valid `YYYY-MM-DD` calendar date, otherwise
/// `today`. Never fails.
pub fn compute_bounded_range(
    requested_range: Option<&str>,
    end_date: Option<&str>,
    options: &RangeOptions,
    today: NaiveDate,
) -> BoundedRange {
    let range = RangeKeyword::parse_or_baseline(requested_range);
    let end_bound = end_date.and_then(parse_calendar_date).unwrap_or(today);
    let lookback = lookback_days(range, options);
    BoundedRange {
        range,
        start_bound: days_before(end_bound, u64::from(lookback) - 1),
        end_bound,
        lookback_days: lookback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn sixty_days_ending_on_given_date() {
        let r = compute_bounded_range(Some("60d"), Some("2026-02-19"), &RangeOptions::default(), date("2030-01-01"));
        assert_eq!(r.start_bound, date("2025-12-22"));
        assert_eq!(r.end_bound, date("2026-02-19"));
        assert_eq!(r.day_count(), 60);
    }

    #[test]
    fn baseline_and_ninety_days_ending_on_given_date() {
        let opts = RangeOptions::default();
        let far = date("2030-01-01");

        let r = compute_bounded_range(Some("baseline"), Some("2026-02-19"), &opts, far);
        assert_eq!(r.start_bound, date("2025-12-22"));
        assert_eq!(r.end_bound, date("2026-02-19"));

        let r = compute_bounded_range(Some("90d"), Some("2026-02-19"), &opts, far);
        assert_eq!(r.start_bound, date("2025-10-23"));
        assert_eq!(r.end_bound, date("2026-02-19"));
        assert_eq!(r.day_count(), 120);
    }

    #[test]
    fn one_eighty_days() {
        let r = compute_bounded_range(Some("180d"), Some("2026-04-20"), &RangeOptions::default(), date("2030-01-01"));
        assert_eq!(r.lookback_days, 210);
        assert_eq!(r.start_bound, date("2025-09-23"));
    }

    #[test]
    fn lookback_table() {
        let opts = RangeOptions::default();
        let table = [
            (RangeKeyword::Last30, 60),
            (RangeKeyword::Last60, 60),
            (RangeKeyword::Baseline, 60),
            (RangeKeyword::Last90, 120),
            (RangeKeyword::Last180, 210),
            (RangeKeyword::All, 365),
        ];
        for (keyword, expected) in table {
            assert_eq!(lookback_days(keyword, &opts), expected, "{}", keyword.as_str());
        }
    }

    #[test]
    fn all_is_capped_unless_unbounded() {
        let capped = compute_bounded_range(Some("all"), Some("2026-02-19"), &RangeOptions::default(), date("2030-01-01"));
        assert_eq!(capped.lookback_days, 365);
        assert_eq!(capped.day_count(), 365);

        let unbounded = RangeOptions {
            unbounded_all: true,
            ..RangeOptions::default()
        };
        let r = compute_bounded_range(Some("all"), Some("2026-02-19"), &unbounded, date("2030-01-01"));
        assert_eq!(r.lookback_days, UNBOUNDED_LOOKBACK_DAYS);
        assert_eq!(r.day_count(), i64::from(UNBOUNDED_LOOKBACK_DAYS));
    }

    #[test]
    fn unknown_keyword_and_bad_end_date_fall_back() {
        let today = date("2026-03-01");
        let r = compute_bounded_range(Some("fortnight"), Some("2026-02-30"), &RangeOptions::default(), today);
        assert_eq!(r.range, RangeKeyword::Baseline);
        assert_eq!(r.end_bound, today);
        assert_eq!(r.lookback_days, BASELINE_LOOKBACK_DAYS);

        let r = compute_bounded_range(None, None, &RangeOptions::default(), today);
        assert_eq!(r.range, RangeKeyword::Baseline);
    }
}

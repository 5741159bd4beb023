//! Calendar date helpers shared by range resolution and window derivation.

use chrono::{Days, NaiveDate};

/// Parse a strict `YYYY-MM-DD` calendar date. Anything else (including
/// impossible dates like `2026-02-30`) is `None`.
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// `date − days`, saturating at the earliest representable date.
pub fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN)
}

/// `date + days`, saturating at the latest representable date.
pub fn days_after(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_calendar_strings() {
        assert!(parse_calendar_date("2026-02-19").is_some());
        assert!(parse_calendar_date(" 2026-02-19 ").is_some());
        assert!(parse_calendar_date("2026-02-30").is_none());
        assert!(parse_calendar_date("2026-2-19").is_none());
        assert!(parse_calendar_date("2026-02-19T00:00:00Z").is_none());
        assert!(parse_calendar_date("").is_none());
    }
}

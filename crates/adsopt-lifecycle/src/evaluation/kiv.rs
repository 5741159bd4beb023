//! KIV carry-forward view.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use adsopt_core::models::KivItem;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KivCarryForward {
    pub open: Vec<KivItem>,
    pub recently_closed: Vec<KivItem>,
}

/// Open items always; closed items whose `resolved_at` (else `created_at`)
/// falls within the last `recent_days` days. Older closed items are left out.
pub fn derive_kiv_carry_forward(items: &[KivItem], now: DateTime<Utc>, recent_days: i64) -> KivCarryForward {
    let cutoff = now - Duration::days(recent_days.max(0));
    let closed_at = |item: &KivItem| item.resolved_at.unwrap_or(item.created_at);

    let mut open: Vec<KivItem> = items.iter().filter(|i| !i.status.is_closed()).cloned().collect();
    let mut recently_closed: Vec<KivItem> = items
        .iter()
        .filter(|i| i.status.is_closed() && closed_at(i) >= cutoff)
        .cloned()
        .collect();

    open.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.kiv_id.cmp(&b.kiv_id)));
    recently_closed.sort_by(|a, b| closed_at(b).cmp(&closed_at(a)).then_with(|| a.kiv_id.cmp(&b.kiv_id)));

    KivCarryForward {
        open,
        recently_closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsopt_core::models::KivStatus;

    fn item(id: &str, status: KivStatus, created_days_ago: i64, resolved_days_ago: Option<i64>, now: DateTime<Utc>) -> KivItem {
        KivItem {
            kiv_id: id.into(),
            account_id: "acct".into(),
            marketplace: "US".into(),
            asin: "B0TEST".into(),
            title: id.into(),
            details: None,
            status,
            created_at: now - Duration::days(created_days_ago),
            resolved_at: resolved_days_ago.map(|d| now - Duration::days(d)),
            source_experiment_id: None,
        }
    }

    #[test]
    fn five_days_kept_forty_days_dropped() {
        let now = Utc::now();
        let items = vec![
            item("open-old", KivStatus::Open, 400, None, now),
            item("done-5", KivStatus::Done, 60, Some(5), now),
            item("done-40", KivStatus::Done, 60, Some(40), now),
            item("dismissed-created-3", KivStatus::Dismissed, 3, None, now),
        ];
        let view = derive_kiv_carry_forward(&items, now, 30);
        assert_eq!(view.open.len(), 1);
        let closed: Vec<_> = view.recently_closed.iter().map(|i| i.kiv_id.as_str()).collect();
        assert_eq!(closed, vec!["dismissed-created-3", "done-5"]);
    }
}

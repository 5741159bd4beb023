//! Major-action selection and KIV carry-forward.

use proptest::prelude::*;

use chrono::{Duration, TimeZone, Utc};

use adsopt_core::models::{ChangeLogEntry, KivItem, KivStatus};
use adsopt_lifecycle::evaluation::kiv::derive_kiv_carry_forward;
use adsopt_lifecycle::evaluation::timeline::{is_interruption_type, pick_major_actions};

const CHANGE_TYPES: [&str; 6] = [
    "update_bid",
    "update_budget",
    "guardrail_breach",
    "manual_intervention",
    "stop_loss",
    "rollback",
];

fn change(i: usize, minutes: i64, change_type: &str) -> ChangeLogEntry {
    ChangeLogEntry {
        change_id: format!("ch-{:03}", i),
        account_id: "acct-1".to_string(),
        marketplace: "US".to_string(),
        occurred_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
        channel: "sp".to_string(),
        change_type: change_type.to_string(),
        summary: None,
        validated_snapshot_date: None,
        experiment_id: Some("exp-1".to_string()),
        run_id: None,
        entities: Vec::new(),
    }
}

proptest! {
    #[test]
    fn major_actions_keep_every_interruption(
        specs in prop::collection::vec((0i64..10_000, 0usize..CHANGE_TYPES.len()), 0..80),
        limit in 0usize..15,
    ) {
        let changes: Vec<ChangeLogEntry> = specs
            .iter()
            .enumerate()
            .map(|(i, (minutes, t))| change(i, *minutes, CHANGE_TYPES[*t]))
            .collect();
        let picked = pick_major_actions(&changes, limit);

        for c in changes.iter().filter(|c| is_interruption_type(&c.change_type)) {
            prop_assert!(picked.contains(&c.change_id), "interruption {} dropped", c.change_id);
        }
        let non_interruptions = picked
            .iter()
            .filter(|id| {
                changes
                    .iter()
                    .any(|c| &c.change_id == *id && !is_interruption_type(&c.change_type))
            })
            .count();
        prop_assert!(non_interruptions <= limit);

        let mut unique = picked.clone();
        unique.sort();
        unique.dedup();
        prop_assert_eq!(unique.len(), picked.len());
    }

    #[test]
    fn carry_forward_partitions_by_status_and_age(
        specs in prop::collection::vec((0usize..3, 0i64..120), 0..40),
        recent_days in 0i64..60,
    ) {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let items: Vec<KivItem> = specs
            .iter()
            .enumerate()
            .map(|(i, (status, age))| {
                let status = [KivStatus::Open, KivStatus::Done, KivStatus::Dismissed][*status];
                KivItem {
                    kiv_id: format!("kiv-{:03}", i),
                    account_id: "acct-1".to_string(),
                    marketplace: "US".to_string(),
                    asin: "B0TEST0001".to_string(),
                    title: "item".to_string(),
                    details: None,
                    status,
                    created_at: now - Duration::days(age + 1),
                    resolved_at: status.is_closed().then(|| now - Duration::days(*age)),
                    source_experiment_id: None,
                }
            })
            .collect();

        let carry = derive_kiv_carry_forward(&items, now, recent_days);
        let open_count = items.iter().filter(|i| i.status == KivStatus::Open).count();
        prop_assert_eq!(carry.open.len(), open_count);
        for item in &carry.recently_closed {
            prop_assert!(item.status.is_closed());
            prop_assert!(item.resolved_at.unwrap() >= now - Duration::days(recent_days));
        }
    }
}

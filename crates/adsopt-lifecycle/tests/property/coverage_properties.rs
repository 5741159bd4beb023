//! Coverage selection, attribution bridge and range resolution.

use proptest::prelude::*;

use chrono::NaiveDate;

use adsopt_core::models::{AdChannel, CampaignSpendRow, TargetSpendRow};
use adsopt_lifecycle::evidence::attribution::{build_attribution_bridge, AttributionInputs};
use adsopt_lifecycle::evidence::builder::split_into_chunks;
use adsopt_lifecycle::evidence::coverage::{select_coverage, CoverageLimits};
use adsopt_lifecycle::evidence::range::{compute_bounded_range, RangeOptions};

fn campaigns(spends: &[f64]) -> Vec<CampaignSpendRow> {
    spends
        .iter()
        .enumerate()
        .map(|(i, spend)| CampaignSpendRow {
            campaign_id: format!("c-{:03}", i),
            campaign_name: None,
            channel: AdChannel::Sp,
            spend: *spend,
            sales: 0.0,
        })
        .collect()
}

fn targets(spends: &[f64], campaign_count: usize) -> Vec<TargetSpendRow> {
    spends
        .iter()
        .enumerate()
        .map(|(i, spend)| TargetSpendRow {
            target_id: format!("t-{:04}", i),
            campaign_id: format!("c-{:03}", i % campaign_count.max(1)),
            ad_group_id: None,
            target_text: None,
            spend: *spend,
            sales: 0.0,
        })
        .collect()
}

fn any_amount() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => 0.0..10_000.0f64,
        1 => Just(-5.0),
        1 => Just(f64::NAN),
    ]
}

proptest! {
    #[test]
    fn coverage_meets_threshold_when_limit_is_not_binding(
        spends in prop::collection::vec(0.01..5_000.0f64, 1..40),
        threshold in 0.5..1.0f64,
    ) {
        let rows = campaigns(&spends);
        let total: f64 = spends.iter().sum();
        let limits = CoverageLimits {
            campaign_limit: rows.len(),
            target_limit: 500,
            coverage_threshold: threshold,
        };
        let selection = select_coverage(total, &rows, &[], &limits);
        let pct = selection.coverage_pct.unwrap();
        prop_assert!(pct + 1e-9 >= threshold, "coverage {} below threshold {}", pct, threshold);
    }

    #[test]
    fn selection_never_exceeds_limits(
        campaign_spends in prop::collection::vec(any_amount(), 0..60),
        target_spends in prop::collection::vec(any_amount(), 0..200),
        campaign_limit in 1usize..20,
        target_limit in 1usize..50,
        mapped_total in -10.0..50_000.0f64,
    ) {
        let rows = campaigns(&campaign_spends);
        let target_rows = targets(&target_spends, rows.len());
        let limits = CoverageLimits { campaign_limit, target_limit, coverage_threshold: 0.95 };
        let selection = select_coverage(mapped_total, &rows, &target_rows, &limits);

        prop_assert!(selection.campaigns.len() <= campaign_limit);
        prop_assert!(selection.targets.len() <= target_limit);
        prop_assert!(selection.campaign_spend_included >= 0.0);
        prop_assert_eq!(selection.coverage_pct.is_none(), mapped_total <= 0.0);
        // Selected campaigns are in descending spend order.
        let included: Vec<f64> = selection
            .campaigns
            .iter()
            .map(|c| if c.spend.is_finite() && c.spend > 0.0 { c.spend } else { 0.0 })
            .collect();
        prop_assert!(included.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn bridge_is_never_negative_and_ratios_follow_denominators(
        reported in any_amount(),
        attributed in any_amount(),
        advertised in any_amount(),
        mapped in any_amount(),
        brand in any_amount(),
    ) {
        let bridge = build_attribution_bridge(&AttributionInputs {
            reported_cost: reported,
            attributed_spend: attributed,
            advertised_spend: advertised,
            mapped_campaign_spend: mapped,
            brand_attributed_spend: brand,
        });
        for value in [
            bridge.reported_cost,
            bridge.attributed_spend,
            bridge.advertised_spend,
            bridge.mapped_campaign_spend,
            bridge.brand_attributed_spend,
            bridge.sp_unattributed_spend_total,
            bridge.gap_vs_attributed_total,
        ] {
            prop_assert!(value.is_finite() && value >= 0.0);
        }
        prop_assert_eq!(
            bridge.sp_unattributed_spend_total,
            (bridge.mapped_campaign_spend - bridge.attributed_spend).max(0.0)
        );
        prop_assert_eq!(
            bridge.gap_vs_attributed_total,
            (bridge.reported_cost - bridge.attributed_spend).max(0.0)
        );
        prop_assert_eq!(bridge.attributed_coverage_of_reported.is_none(), bridge.reported_cost <= 0.0);
        prop_assert_eq!(bridge.advertised_coverage_of_reported.is_none(), bridge.reported_cost <= 0.0);
        prop_assert_eq!(bridge.brand_attributed_coverage_of_reported.is_none(), bridge.reported_cost <= 0.0);
        prop_assert_eq!(
            bridge.attributed_coverage_of_mapped_campaign.is_none(),
            bridge.mapped_campaign_spend <= 0.0
        );
    }

    #[test]
    fn chunks_tile_the_range_exactly(
        keyword in prop::sample::select(vec!["30d", "60d", "90d", "180d", "all", "baseline", "bogus"]),
        offset in 0i64..3_000,
        chunk_days in 1u32..120,
    ) {
        let end = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(offset);
        let end_str = end.format("%Y-%m-%d").to_string();
        let range = compute_bounded_range(Some(keyword), Some(&end_str), &RangeOptions::default(), end);
        prop_assert_eq!(range.end_bound, end);
        prop_assert_eq!(range.day_count(), i64::from(range.lookback_days));
        let expected_lookback = match keyword {
            "90d" => 120,
            "180d" => 210,
            "all" => 365,
            _ => 60,
        };
        prop_assert_eq!(range.lookback_days, expected_lookback);

        let chunks = split_into_chunks(&range, chunk_days);
        prop_assert_eq!(chunks.first().map(|c| c.0), Some(range.start_bound));
        prop_assert_eq!(chunks.last().map(|c| c.1), Some(range.end_bound));
        for pair in chunks.windows(2) {
            prop_assert_eq!(pair[0].1.succ_opt(), Some(pair[1].0));
        }
        for (start, end) in &chunks {
            prop_assert!((*end - *start).num_days() < i64::from(chunk_days));
        }
    }
}

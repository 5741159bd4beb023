//! Coverage-based selection of campaign and target rows.
//!
//! Rows are taken in descending spend order until the included spend reaches
//! `threshold × mapped_spend_total` or the row limit is hit, whichever comes
//! first. Targets are then restricted to the selected campaigns and selected
//! the same way.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use adsopt_core::config::EvidenceConfig;
use adsopt_core::models::{CampaignSpendRow, TargetSpendRow};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageLimits {
    pub campaign_limit: usize,
    pub target_limit: usize,
    pub coverage_threshold: f64,
}

impl Default for CoverageLimits {
    fn default() -> Self {
        Self {
            campaign_limit: 50,
            target_limit: 500,
            coverage_threshold: 0.95,
        }
    }
}

impl From<&EvidenceConfig> for CoverageLimits {
    fn from(config: &EvidenceConfig) -> Self {
        Self {
            campaign_limit: config.campaign_limit,
            target_limit: config.target_limit,
            coverage_threshold: config.coverage_threshold,
        }
    }
}

/// Result of one selection. Counts of what was available are kept so readers
/// can see how much was left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSelection {
    pub campaigns: Vec<CampaignSpendRow>,
    pub targets: Vec<TargetSpendRow>,
    pub campaigns_available: usize,
    pub targets_available: usize,
    pub campaign_spend_included: f64,
    pub target_spend_included: f64,
    /// Included campaign spend / mapped total. `None` when the total is not positive.
    pub coverage_pct: Option<f64>,
    pub target_coverage_pct: Option<f64>,
    /// True when no campaign was selected and targets were drawn from every campaign.
    pub targets_unrestricted: bool,
}

impl CoverageSelection {
    pub fn campaigns_truncated(&self) -> bool {
        self.campaigns.len() < self.campaigns_available
    }

    pub fn targets_truncated(&self) -> bool {
        self.targets.len() < self.targets_available
    }
}

/// Spend as used for ordering and sums: non-finite or negative counts as zero.
pub fn effective_spend(spend: f64) -> f64 {
    if spend.is_finite() && spend > 0.0 {
        spend
    } else {
        0.0
    }
}

pub fn select_coverage(
    mapped_spend_total: f64,
    campaigns: &[CampaignSpendRow],
    targets: &[TargetSpendRow],
    limits: &CoverageLimits,
) -> CoverageSelection {
    let goal = coverage_goal(mapped_spend_total, limits.coverage_threshold);

    let (selected_campaigns, campaign_spend) = greedy_take(
        campaigns.to_vec(),
        |c| c.spend,
        |c| c.campaign_id.as_str(),
        limits.campaign_limit,
        goal,
    );

    let selected_ids: HashSet<&str> = selected_campaigns
        .iter()
        .map(|c| c.campaign_id.as_str())
        .collect();
    let targets_unrestricted = selected_ids.is_empty();
    let candidate_targets: Vec<TargetSpendRow> = targets
        .iter()
        .filter(|t| targets_unrestricted || selected_ids.contains(t.campaign_id.as_str()))
        .cloned()
        .collect();
    let targets_available = candidate_targets.len();

    let (selected_targets, target_spend) = greedy_take(
        candidate_targets,
        |t| t.spend,
        |t| t.target_id.as_str(),
        limits.target_limit,
        goal,
    );

    CoverageSelection {
        campaigns_available: campaigns.len(),
        targets_available,
        coverage_pct: share_of(campaign_spend, mapped_spend_total),
        target_coverage_pct: share_of(target_spend, mapped_spend_total),
        campaign_spend_included: campaign_spend,
        target_spend_included: target_spend,
        campaigns: selected_campaigns,
        targets: selected_targets,
        targets_unrestricted,
    }
}

/// Top `limit` rows by spend with no coverage goal (used for SB/SD listings).
pub fn top_by_spend(rows: &[CampaignSpendRow], limit: usize) -> Vec<CampaignSpendRow> {
    greedy_take(rows.to_vec(), |c| c.spend, |c| c.campaign_id.as_str(), limit, None).0
}

fn coverage_goal(mapped_spend_total: f64, threshold: f64) -> Option<f64> {
    if mapped_spend_total.is_finite() && mapped_spend_total > 0.0 {
        Some(mapped_spend_total * threshold)
    } else {
        None
    }
}

fn share_of(part: f64, total: f64) -> Option<f64> {
    if total.is_finite() && total > 0.0 {
        Some(part / total)
    } else {
        None
    }
}

/// Sort by spend descending (ties by id ascending) and take rows until the
/// goal is met or `limit` rows are taken. With no goal, takes up to `limit`.
fn greedy_take<T>(
    mut rows: Vec<T>,
    spend: impl Fn(&T) -> f64,
    id: impl Fn(&T) -> &str,
    limit: usize,
    goal: Option<f64>,
) -> (Vec<T>, f64) {
    rows.sort_by(|a, b| {
        effective_spend(spend(b))
            .total_cmp(&effective_spend(spend(a)))
            .then_with(|| id(a).cmp(id(b)))
    });

    let mut taken = Vec::with_capacity(limit.min(rows.len()));
    let mut included = 0.0;
    for row in rows {
        if taken.len() >= limit {
            break;
        }
        if goal.is_some_and(|g| included >= g) {
            break;
        }
        included += effective_spend(spend(&row));
        taken.push(row);
    }
    (taken, included)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adsopt_core::models::AdChannel;

    fn campaign(id: &str, spend: f64) -> CampaignSpendRow {
        CampaignSpendRow {
            campaign_id: id.to_string(),
            campaign_name: None,
            channel: AdChannel::Sp,
            spend,
            sales: 0.0,
        }
    }

    fn target(id: &str, campaign_id: &str, spend: f64) -> TargetSpendRow {
        TargetSpendRow {
            target_id: id.to_string(),
            campaign_id: campaign_id.to_string(),
            ad_group_id: None,
            target_text: None,
            spend,
            sales: 0.0,
        }
    }

    #[test]
    fn stops_once_threshold_reached() {
        let campaigns = vec![campaign("a", 10.0), campaign("b", 90.0), campaign("c", 5.0)];
        let sel = select_coverage(105.0, &campaigns, &[], &CoverageLimits::default());
        // 90 < 99.75, 90 + 10 = 100 ≥ 99.75
        let ids: Vec<_> = sel.campaigns.iter().map(|c| c.campaign_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(sel.campaigns_truncated());
        assert!((sel.coverage_pct.unwrap() - 100.0 / 105.0).abs() < 1e-12);
    }

    #[test]
    fn limit_caps_before_threshold() {
        let campaigns: Vec<_> = (0..10).map(|i| campaign(&format!("c{}", i), 10.0)).collect();
        let limits = CoverageLimits {
            campaign_limit: 3,
            ..CoverageLimits::default()
        };
        let sel = select_coverage(100.0, &campaigns, &[], &limits);
        assert_eq!(sel.campaigns.len(), 3);
        // equal spend → id order
        assert_eq!(sel.campaigns[0].campaign_id, "c0");
        assert!((sel.coverage_pct.unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn non_positive_total_takes_up_to_limit_without_pct() {
        let campaigns = vec![campaign("a", 1.0), campaign("b", 2.0)];
        let sel = select_coverage(0.0, &campaigns, &[], &CoverageLimits::default());
        assert_eq!(sel.campaigns.len(), 2);
        assert!(sel.coverage_pct.is_none());
    }

    #[test]
    fn targets_restricted_to_selected_campaigns() {
        let campaigns = vec![campaign("big", 100.0), campaign("tiny", 1.0)];
        let targets = vec![target("t1", "big", 60.0), target("t2", "tiny", 1.0), target("t3", "big", 40.0)];
        let sel = select_coverage(101.0, &campaigns, &targets, &CoverageLimits::default());
        assert_eq!(sel.campaigns.len(), 1);
        assert!(sel.targets.iter().all(|t| t.campaign_id == "big"));
        assert_eq!(sel.targets_available, 2);
        assert!(!sel.targets_unrestricted);
    }

    #[test]
    fn no_campaigns_means_unrestricted_targets() {
        let targets = vec![target("t1", "x", 5.0), target("t2", "y", 3.0)];
        let sel = select_coverage(8.0, &[], &targets, &CoverageLimits::default());
        assert!(sel.targets_unrestricted);
        assert_eq!(sel.targets.len(), 2);
    }

    #[test]
    fn nan_and_negative_spend_sort_last() {
        let campaigns = vec![campaign("n", f64::NAN), campaign("neg", -4.0), campaign("p", 1.0)];
        let sel = select_coverage(0.0, &campaigns, &[], &CoverageLimits::default());
        assert_eq!(sel.campaigns[0].campaign_id, "p");
        assert_eq!(sel.campaign_spend_included, 1.0);
    }
}

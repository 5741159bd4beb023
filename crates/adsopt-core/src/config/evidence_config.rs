//! Evidence pack builder configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{AdsOptError, AdsOptResult};

/// What the builder does when some chunk fetches fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessPolicy {
    /// Keep whatever succeeded; the pack is `degraded`.
    #[default]
    BestEffort,
    /// Any failed chunk marks the pack `pack_incomplete`.
    RequireComplete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    pub campaign_limit: usize,
    pub target_limit: usize,
    pub coverage_threshold: f64,
    /// Lookback for the `all` keyword when not unbounded.
    pub all_range_cap_days: u32,
    /// Lets `all` mean effectively unbounded (100,000 days).
    pub allow_unbounded_all: bool,
    /// Size of one date chunk for spend fetches.
    pub chunk_days: u32,
    pub completeness: CompletenessPolicy,
    /// Upper bound on concurrent chunk fetches. 0 = rayon default.
    pub max_parallel_fetches: usize,
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            campaign_limit: 50,
            target_limit: 500,
            coverage_threshold: 0.95,
            all_range_cap_days: 365,
            allow_unbounded_all: false,
            chunk_days: 31,
            completeness: CompletenessPolicy::BestEffort,
            max_parallel_fetches: 4,
        }
    }
}

impl EvidenceConfig {
    pub fn validate(&self) -> AdsOptResult<()> {
        if !(self.coverage_threshold > 0.0 && self.coverage_threshold <= 1.0) {
            return Err(AdsOptError::Config(format!(
                "evidence.coverage_threshold must be in (0, 1], got {}",
                self.coverage_threshold
            )));
        }
        if self.campaign_limit == 0 || self.target_limit == 0 {
            return Err(AdsOptError::Config(
                "evidence.campaign_limit and evidence.target_limit must be positive".to_string(),
            ));
        }
        if self.chunk_days == 0 {
            return Err(AdsOptError::Config("evidence.chunk_days must be positive".to_string()));
        }
        if self.all_range_cap_days == 0 {
            return Err(AdsOptError::Config(
                "evidence.all_range_cap_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

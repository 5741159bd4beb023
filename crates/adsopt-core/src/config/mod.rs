pub mod evaluation_config;
pub mod evidence_config;
pub mod observability_config;
pub mod storage_config;

use serde::{Deserialize, Serialize};

pub use evaluation_config::EvaluationConfig;
pub use evidence_config::{CompletenessPolicy, EvidenceConfig};
pub use observability_config::ObservabilityConfig;
pub use storage_config::StorageConfig;

use crate::errors::{AdsOptError, AdsOptResult};

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdsOptConfig {
    pub evidence: EvidenceConfig,
    pub evaluation: EvaluationConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

impl AdsOptConfig {
    /// Load config from a TOML string, falling back to defaults for missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Parse and validate in one step.
    pub fn load(toml_str: &str) -> AdsOptResult<Self> {
        let config = Self::from_toml(toml_str).map_err(|e| AdsOptError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make the algorithms meaningless.
    pub fn validate(&self) -> AdsOptResult<()> {
        self.evidence.validate()?;
        self.evaluation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = AdsOptConfig::from_toml("").unwrap();
        assert_eq!(config.evidence.campaign_limit, 50);
        assert_eq!(config.evidence.target_limit, 500);
        assert!((config.evidence.coverage_threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(config.evidence.all_range_cap_days, 365);
        assert_eq!(config.evaluation.kiv_recent_days, 30);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = AdsOptConfig::load(
            r#"
            [evidence]
            campaign_limit = 20
            completeness = "require_complete"
            "#,
        )
        .unwrap();
        assert_eq!(config.evidence.campaign_limit, 20);
        assert_eq!(config.evidence.target_limit, 500);
        assert_eq!(config.evidence.completeness, CompletenessPolicy::RequireComplete);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let err = AdsOptConfig::load("[evidence]\ncoverage_threshold = 1.5\n").unwrap_err();
        assert!(matches!(err, AdsOptError::Config(_)));
    }
}

//! Evaluation and timeline configuration.

use serde::{Deserialize, Serialize};

use crate::errors::{AdsOptError, AdsOptResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Trailing window for closed KIV items in the carry-forward view.
    pub kiv_recent_days: i64,
    /// How many changes the timeline shows before appending interruptions.
    pub major_action_limit: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            kiv_recent_days: 30,
            major_action_limit: 10,
        }
    }
}

impl EvaluationConfig {
    pub fn validate(&self) -> AdsOptResult<()> {
        if self.kiv_recent_days < 0 {
            return Err(AdsOptError::Config(
                "evaluation.kiv_recent_days must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

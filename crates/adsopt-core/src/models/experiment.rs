//! Experiment aggregate: identity, objective, and the mutable `scope` document.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::contract::AdsOptimizationContract;
use super::ScopeContext;
use crate::errors::AdsOptResult;

/// Key of the ads optimization contract under `scope.contract`.
pub const CONTRACT_KEY: &str = "ads_optimization_v1";

/// Lifecycle status, derived from `scope.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    Planned,
    Proposed,
    Reviewed,
    Finalized,
    Executed,
    Evaluated,
}

impl ExperimentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Proposed => "proposed",
            Self::Reviewed => "reviewed",
            Self::Finalized => "finalized",
            Self::Executed => "executed",
            Self::Evaluated => "evaluated",
        }
    }

    /// Case-insensitive parse; stored documents have used both `PROPOSED` and `proposed`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "planned" => Some(Self::Planned),
            "proposed" => Some(Self::Proposed),
            "reviewed" => Some(Self::Reviewed),
            "finalized" => Some(Self::Finalized),
            "executed" => Some(Self::Executed),
            "evaluated" => Some(Self::Evaluated),
            _ => None,
        }
    }

    /// Status of a scope document. Missing or unrecognized → `Planned`.
    pub fn from_scope(scope: &Value) -> Self {
        scope
            .get("status")
            .and_then(Value::as_str)
            .and_then(Self::parse)
            .unwrap_or(Self::Planned)
    }

    /// True once a final plan exists (finalized or any later stage).
    pub fn is_finalized_or_later(&self) -> bool {
        *self >= Self::Finalized
    }
}

impl fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One experiment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub account_id: String,
    pub marketplace: String,
    pub asin: Option<String>,
    pub name: String,
    pub objective: String,
    pub hypothesis: Option<String>,
    #[serde(default)]
    pub guardrails: Value,
    pub evaluation_lag_days: Option<u32>,
    pub evaluation_window_days: Option<u32>,
    /// Mutable document holding status and nested contract state.
    #[serde(default)]
    pub scope: Value,
    /// Optimistic-concurrency token; bumped on every scope write.
    #[serde(default)]
    pub scope_version: i64,
    pub created_at: DateTime<Utc>,
}

impl Experiment {
    /// New experiment in `planned` status with an empty scope.
    pub fn new(
        id: impl Into<String>,
        ctx: &ScopeContext,
        name: impl Into<String>,
        objective: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: ctx.account_id.clone(),
            marketplace: ctx.marketplace.clone(),
            asin: None,
            name: name.into(),
            objective: objective.into(),
            hypothesis: None,
            guardrails: Value::Null,
            evaluation_lag_days: None,
            evaluation_window_days: None,
            scope: Value::Object(Map::new()),
            scope_version: 0,
            created_at,
        }
    }

    pub fn context(&self) -> ScopeContext {
        ScopeContext::new(&self.account_id, &self.marketplace)
    }

    pub fn belongs_to(&self, ctx: &ScopeContext) -> bool {
        ctx.matches(&self.account_id, &self.marketplace)
    }

    pub fn status(&self) -> ExperimentStatus {
        ExperimentStatus::from_scope(&self.scope)
    }

    pub fn set_status(&mut self, status: ExperimentStatus) {
        scope_object(&mut self.scope).insert("status".to_string(), Value::from(status.as_str()));
    }

    /// A string field of the scope document, e.g. `start_date`.
    pub fn scope_str(&self, key: &str) -> Option<&str> {
        self.scope.get(key).and_then(Value::as_str)
    }

    /// Typed view of `scope.contract.ads_optimization_v1`. Missing → empty contract.
    pub fn contract(&self) -> AdsOptResult<AdsOptimizationContract> {
        AdsOptimizationContract::from_scope(&self.scope)
    }

    /// Write the contract back into the scope, leaving sibling keys untouched.
    pub fn set_contract(&mut self, contract: &AdsOptimizationContract) -> AdsOptResult<()> {
        let value = serde_json::to_value(contract)?;
        let scope = scope_object(&mut self.scope);
        let contract_slot = scope
            .entry("contract".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !contract_slot.is_object() {
            *contract_slot = Value::Object(Map::new());
        }
        if let Value::Object(map) = contract_slot {
            map.insert(CONTRACT_KEY.to_string(), value);
        }
        Ok(())
    }
}

/// Coerce the scope into an object so nested writes never fail.
fn scope_object(scope: &mut Value) -> &mut Map<String, Value> {
    if !scope.is_object() {
        *scope = Value::Object(Map::new());
    }
    match scope {
        Value::Object(map) => map,
        _ => unreachable!("scope coerced to object above"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn experiment() -> Experiment {
        Experiment::new("exp-1", &ScopeContext::new("acct", "US"), "Bid test", "Lower ACoS", Utc::now())
    }

    #[test]
    fn status_defaults_to_planned() {
        let mut exp = experiment();
        assert_eq!(exp.status(), ExperimentStatus::Planned);
        exp.scope = json!({ "status": "weird" });
        assert_eq!(exp.status(), ExperimentStatus::Planned);
        exp.scope = json!({ "status": "FINALIZED" });
        assert_eq!(exp.status(), ExperimentStatus::Finalized);
    }

    #[test]
    fn set_contract_preserves_sibling_scope_keys() {
        let mut exp = experiment();
        exp.scope = json!({ "status": "proposed", "start_date": "2026-01-01", "contract": { "other_v2": { "x": 1 } } });
        exp.set_contract(&AdsOptimizationContract::default()).unwrap();
        assert_eq!(exp.scope_str("start_date"), Some("2026-01-01"));
        assert_eq!(exp.scope["contract"]["other_v2"]["x"], 1);
        assert!(exp.scope["contract"][CONTRACT_KEY].is_object());
        assert_eq!(exp.status(), ExperimentStatus::Proposed);
    }
}

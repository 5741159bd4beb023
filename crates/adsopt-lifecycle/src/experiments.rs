//! Scoped experiment loading and the single compare-and-swap scope commit every
//! lifecycle mutation goes through.

use tracing::debug;

use adsopt_core::errors::{AdsOptError, AdsOptResult, IssueCode, ValidationFailure, ValidationIssue};
use adsopt_core::models::{Experiment, ScopeContext};
use adsopt_core::traits::IRecordStore;

/// Load an experiment that must belong to `ctx`.
///
/// An experiment owned by another account/marketplace is a semantic
/// `entity_scope_mismatch`, never a silent not-found.
pub fn load_experiment(
    store: &dyn IRecordStore,
    ctx: &ScopeContext,
    experiment_id: &str,
) -> AdsOptResult<Experiment> {
    let experiment = store
        .get_experiment(experiment_id)?
        .ok_or_else(|| AdsOptError::ExperimentNotFound {
            experiment_id: experiment_id.to_string(),
        })?;
    if !experiment.belongs_to(ctx) {
        return Err(AdsOptError::SemanticValidation(ValidationFailure::new(vec![
            ValidationIssue::new(
                IssueCode::EntityScopeMismatch,
                "experiment_id",
                experiment_id,
                format!(
                    "experiment {} belongs to {}/{}, not {}/{}",
                    experiment_id,
                    experiment.account_id,
                    experiment.marketplace,
                    ctx.account_id,
                    ctx.marketplace
                ),
            ),
        ])));
    }
    Ok(experiment)
}

/// Write the experiment's scope back, conditional on the version it was read at.
/// On success the in-memory version is advanced.
pub fn commit_scope(store: &dyn IRecordStore, experiment: &mut Experiment) -> AdsOptResult<()> {
    let new_version =
        store.update_experiment_scope(&experiment.id, experiment.scope_version, &experiment.scope)?;
    debug!(
        experiment_id = %experiment.id,
        from = experiment.scope_version,
        to = new_version,
        "Scope committed"
    );
    experiment.scope_version = new_version;
    Ok(())
}

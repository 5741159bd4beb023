//! Semantic boundary validation for AI-authored documents.

pub mod decision_ids;
pub mod gate;

pub use decision_ids::{validate_override_values, validate_review_patch_decision_ids};
pub use gate::SemanticGate;

//! Evaluation and timeline derivation.

pub mod importer;
pub mod kiv;
pub mod outcome;
pub mod timeline;
pub mod window;

pub use importer::{EvaluationImporter, ImportOutcome};
pub use kiv::{derive_kiv_carry_forward, KivCarryForward};
pub use outcome::{normalize_outcome_score, outcome_tone};
pub use timeline::{derive_timeline, is_interruption_type, pick_major_actions, Timeline, TimelineEntry};
pub use window::derive_experiment_date_window;

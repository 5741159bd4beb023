//! # adsopt-core
//!
//! Foundation types for the ads optimization experiment lifecycle.
//!
//! ## Modules
//! - `config`: AdsOptConfig and per-subsystem sections, TOML loading, validation
//! - `errors`: AdsOptError, ValidationIssue/IssueCode, RecoveryAction
//! - `models`: experiments, plans, review decisions, final plans, change log,
//!   events, KIV items, boundary documents
//! - `traits`: IRecordStore and ISpendSource, the external collaborator contracts

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::AdsOptConfig;
pub use errors::{AdsOptError, AdsOptResult};
pub use models::ScopeContext;

pub mod adsopt_error;
pub mod recovery;
pub mod validation_issue;

pub use adsopt_error::{AdsOptError, AdsOptResult};
pub use recovery::RecoveryAction;
pub use validation_issue::{IssueCode, ValidationFailure, ValidationIssue};

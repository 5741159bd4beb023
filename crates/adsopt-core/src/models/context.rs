use serde::{Deserialize, Serialize};

/// The account/marketplace a request acts on.
///
/// Threaded explicitly through every component call; there is no process-wide
/// "current account".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeContext {
    pub account_id: String,
    pub marketplace: String,
}

impl ScopeContext {
    pub fn new(account_id: impl Into<String>, marketplace: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            marketplace: marketplace.into(),
        }
    }

    pub fn matches(&self, account_id: &str, marketplace: &str) -> bool {
        self.account_id == account_id && self.marketplace.eq_ignore_ascii_case(marketplace)
    }
}

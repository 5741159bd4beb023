//! `ISpendSource` trait: chunked spend aggregates for evidence packs.
//!
//! A fetch either returns rows or a `ChunkFetchError`; it never panics and is
//! never retried here. The builder turns failures into diagnostics.

use std::fmt;
use std::sync::Arc;

use crate::models::{
    AdChannel, CampaignSpendRow, SpendQuery, SpendReconciliationRow, TargetSpendRow,
};

/// Why one chunk fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChunkFetchError {
    Timeout { reason: String },
    Failed { reason: String },
}

impl ChunkFetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for ChunkFetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { reason } => write!(f, "timeout: {}", reason),
            Self::Failed { reason } => write!(f, "error: {}", reason),
        }
    }
}

impl std::error::Error for ChunkFetchError {}

pub type ChunkResult<T> = Result<T, ChunkFetchError>;

pub trait ISpendSource: Send + Sync {
    /// Campaign-level spend for the ASIN on one channel.
    fn campaign_spend(
        &self,
        query: &SpendQuery,
        channel: AdChannel,
    ) -> ChunkResult<Vec<CampaignSpendRow>>;

    /// Sponsored Products target-level spend for the ASIN.
    fn target_spend(&self, query: &SpendQuery) -> ChunkResult<Vec<TargetSpendRow>>;

    /// Reported / attributed / advertised spend totals for the ASIN.
    fn spend_reconciliation(&self, query: &SpendQuery) -> ChunkResult<SpendReconciliationRow>;
}

impl<T: ISpendSource + ?Sized> ISpendSource for Arc<T> {
    fn campaign_spend(
        &self,
        query: &SpendQuery,
        channel: AdChannel,
    ) -> ChunkResult<Vec<CampaignSpendRow>> {
        (**self).campaign_spend(query, channel)
    }
    fn target_spend(&self, query: &SpendQuery) -> ChunkResult<Vec<TargetSpendRow>> {
        (**self).target_spend(query)
    }
    fn spend_reconciliation(&self, query: &SpendQuery) -> ChunkResult<SpendReconciliationRow> {
        (**self).spend_reconciliation(query)
    }
}

//! Chunk diagnostics: turns per-chunk fetch outcomes into severity-coded pack
//! messages.
//!
//! Classification only looks at counts, so the order in which chunk results
//! arrive never changes the message.

use serde::{Deserialize, Serialize};

use adsopt_core::models::AdChannel;
use adsopt_core::traits::ChunkFetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warn,
    Error,
}

/// One user-facing pack message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMessage {
    pub level: MessageLevel,
    pub code: String,
    pub text: String,
}

impl PackMessage {
    pub fn new(level: MessageLevel, code: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            level,
            code: code.into(),
            text: text.into(),
        }
    }
}

/// What kind of failures a batch saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    Timeouts,
    Errors,
    Mixed,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeouts => "timeouts",
            Self::Errors => "errors",
            Self::Mixed => "mixed errors",
        }
    }
}

/// Phrasing family for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchFlavor {
    SpendReconciliation,
    Labeled,
}

/// Counts for one batch of chunk fetches (one channel or one report).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkBatchOutcome {
    pub label: String,
    pub total: usize,
    pub failed: usize,
    pub timeouts: usize,
}

impl ChunkBatchOutcome {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn record_ok(&mut self) {
        self.total += 1;
    }

    pub fn record_failure(&mut self, error: &ChunkFetchError) {
        self.total += 1;
        self.failed += 1;
        if error.is_timeout() {
            self.timeouts += 1;
        }
    }

    pub fn all_failed(&self) -> bool {
        self.total > 0 && self.failed == self.total
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        if self.failed == 0 {
            None
        } else if self.timeouts == self.failed {
            Some(FailureKind::Timeouts)
        } else if self.timeouts == 0 {
            Some(FailureKind::Errors)
        } else {
            Some(FailureKind::Mixed)
        }
    }
}

/// `None` when nothing failed; `error/CHUNK_FAILED` when everything failed;
/// `warn/CHUNK_PARTIAL` otherwise.
pub fn classify_chunk_batch(outcome: &ChunkBatchOutcome, flavor: BatchFlavor) -> Option<PackMessage> {
    let kind = outcome.failure_kind()?;
    let all = outcome.all_failed();
    let (level, code) = if all {
        (MessageLevel::Error, "CHUNK_FAILED")
    } else {
        (MessageLevel::Warn, "CHUNK_PARTIAL")
    };

    let text = match (flavor, all) {
        (BatchFlavor::SpendReconciliation, true) => format!(
            "Spend reconciliation unavailable: all {} date chunks failed ({}). Attribution figures are zero.",
            outcome.total,
            kind.as_str()
        ),
        (BatchFlavor::SpendReconciliation, false) => format!(
            "Spend reconciliation is partial: {} of {} date chunks failed ({}). Attribution figures are understated.",
            outcome.failed,
            outcome.total,
            kind.as_str()
        ),
        (BatchFlavor::Labeled, true) => format!(
            "{}: all {} date chunks failed ({}); no rows loaded.",
            outcome.label,
            outcome.total,
            kind.as_str()
        ),
        (BatchFlavor::Labeled, false) => format!(
            "{}: {} of {} date chunks failed ({}); totals may be understated.",
            outcome.label,
            outcome.failed,
            outcome.total,
            kind.as_str()
        ),
    };
    Some(PackMessage::new(level, code, text))
}

/// Info message for a channel that simply has no rows for this ASIN.
pub fn no_rows_for_asin(channel: AdChannel, asin: &str) -> PackMessage {
    let code = format!("NO_{}_FOR_ASIN", channel.as_str().to_ascii_uppercase());
    let name = match channel {
        AdChannel::Sp => "Sponsored Products",
        AdChannel::Sb => "Sponsored Brands",
        AdChannel::Sd => "Sponsored Display",
    };
    PackMessage::new(
        MessageLevel::Info,
        code,
        format!("No {} campaigns spent on {} in this range.", name, asin),
    )
}

/// Plain-string warnings for older consumers: warn/error texts only.
pub fn legacy_warnings(messages: &[PackMessage]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| m.level >= MessageLevel::Warn)
        .map(|m| m.text.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(total: usize, failures: &[ChunkFetchError]) -> ChunkBatchOutcome {
        let mut b = ChunkBatchOutcome::new("SP campaigns");
        for _ in 0..total - failures.len() {
            b.record_ok();
        }
        for f in failures {
            b.record_failure(f);
        }
        b
    }

    fn timeout() -> ChunkFetchError {
        ChunkFetchError::Timeout { reason: "slow".into() }
    }

    fn failed() -> ChunkFetchError {
        ChunkFetchError::Failed { reason: "boom".into() }
    }

    #[test]
    fn no_failures_no_message() {
        assert!(classify_chunk_batch(&batch(4, &[]), BatchFlavor::Labeled).is_none());
    }

    #[test]
    fn all_timeouts_is_error() {
        let msg = classify_chunk_batch(&batch(2, &[timeout(), timeout()]), BatchFlavor::Labeled).unwrap();
        assert_eq!(msg.level, MessageLevel::Error);
        assert_eq!(msg.code, "CHUNK_FAILED");
        assert!(msg.text.contains("timeouts"));
    }

    #[test]
    fn partial_mixed_is_warn() {
        let msg = classify_chunk_batch(&batch(5, &[timeout(), failed()]), BatchFlavor::Labeled).unwrap();
        assert_eq!(msg.level, MessageLevel::Warn);
        assert_eq!(msg.code, "CHUNK_PARTIAL");
        assert!(msg.text.contains("mixed errors"));
        assert!(msg.text.contains("2 of 5"));
    }

    #[test]
    fn reconciliation_uses_its_own_phrasing() {
        let msg = classify_chunk_batch(&batch(3, &[failed()]), BatchFlavor::SpendReconciliation).unwrap();
        assert!(msg.text.starts_with("Spend reconciliation"));
        assert!(msg.text.contains("errors"));
    }

    #[test]
    fn order_of_results_does_not_matter() {
        let mut a = ChunkBatchOutcome::new("x");
        a.record_failure(&timeout());
        a.record_ok();
        a.record_failure(&failed());
        let mut b = ChunkBatchOutcome::new("x");
        b.record_ok();
        b.record_failure(&failed());
        b.record_failure(&timeout());
        assert_eq!(
            classify_chunk_batch(&a, BatchFlavor::Labeled),
            classify_chunk_batch(&b, BatchFlavor::Labeled)
        );
    }

    #[test]
    fn legacy_warnings_skip_info() {
        let messages = vec![
            no_rows_for_asin(AdChannel::Sb, "B0TEST"),
            PackMessage::new(MessageLevel::Warn, "CHUNK_PARTIAL", "w"),
            PackMessage::new(MessageLevel::Error, "CHUNK_FAILED", "e"),
        ];
        assert_eq!(messages[0].code, "NO_SB_FOR_ASIN");
        assert_eq!(legacy_warnings(&messages), vec!["w".to_string(), "e".to_string()]);
    }
}

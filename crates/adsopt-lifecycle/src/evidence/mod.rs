//! Evidence pack construction: range resolution, coverage selection,
//! attribution bridge, chunk diagnostics, and the builder that ties them together.

pub mod attribution;
pub mod builder;
pub mod coverage;
pub mod diagnostics;
pub mod pack;
pub mod range;

pub use attribution::{build_attribution_bridge, AttributionBridge, AttributionInputs};
pub use builder::{EvidencePackBuilder, EvidenceRequest};
pub use coverage::{select_coverage, CoverageLimits, CoverageSelection};
pub use diagnostics::{
    classify_chunk_batch, legacy_warnings, BatchFlavor, ChunkBatchOutcome, MessageLevel, PackMessage,
};
pub use pack::{EvidencePack, PackStatus};
pub use range::{compute_bounded_range, BoundedRange, RangeKeyword, RangeOptions};

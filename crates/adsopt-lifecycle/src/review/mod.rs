//! Review → finalize: the merge engine, the lifecycle operations around it, and
//! execution plan selection.

pub mod merge;
pub mod selection;
pub mod workflow;

pub use merge::build_final_plan_snapshot;
pub use selection::select_bulkgen_plans_for_execution;
pub use workflow::{
    finalize, mark_bulksheet_generated, store_proposal, store_review_patch, ProposalStored,
    ReviewPatchStored,
};

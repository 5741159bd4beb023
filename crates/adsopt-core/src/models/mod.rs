pub mod change;
pub mod context;
pub mod contract;
pub mod documents;
pub mod driver_intent;
pub mod entity;
pub mod evaluation;
pub mod event;
pub mod experiment;
pub mod final_plan;
pub mod kiv;
pub mod plan;
pub mod review;
pub mod spend;

pub use change::{ChangeEntityLink, ChangeLogEntry};
pub use context::ScopeContext;
pub use contract::{AdsOptimizationContract, ExecutionRecord, StoredProposal, StoredReviewPatch};
pub use documents::{
    DocumentKind, Evaluation, EvaluationBody, EvaluationPack, InboundPack, KivUpdate,
    OutcomeClaim, ProductRef, ProposalPack,
};
pub use driver_intent::DriverCampaignIntent;
pub use entity::{EntityKind, EntityRecord};
pub use evaluation::{DateWindow, DateWindowSource, EvaluationRecord, OutcomeTone};
pub use event::{ExperimentEvent, ExperimentEventType};
pub use experiment::{Experiment, ExperimentStatus, CONTRACT_KEY};
pub use final_plan::{FinalAction, FinalPlan, FinalPlanEntry, FinalPlanSummary};
pub use kiv::{KivItem, KivStatus};
pub use plan::{AdChannel, BulkgenPlan, PlanAction};
pub use review::{DecisionKind, ReviewDecision, ReviewPatchPack};
pub use spend::{CampaignSpendRow, SpendQuery, SpendReconciliationRow, TargetSpendRow};

//! Decision aggregation.
//!
//! Folds assessments and anomaly reports into one advisory system state per
//! cycle. The aggregator never commands anything: its strongest output is a
//! recommendation that a human must approve.

mod aggregator;
mod state;

pub use aggregator::{DecisionAggregator, DecisionInputs, DecisionResult};
pub use state::{
    AdvisoryState, ApprovalRequired, HumanReviewState, NoAction, Recommendation, SystemMode,
};

//! Advisory decision-support core for the Skywatch airspace monitoring platform.
//!
//! The pipeline turns noisy, intermittent sensor detections into persistent
//! tracks, per-track risk assessments and domain anomaly reports, then resolves
//! them into a single system-wide advisory mode. Every output is descriptive:
//! the default action is the literal `NO_ACTION` and cannot be constructed
//! otherwise, and all recommendations require human approval by type.

pub mod anomaly;
pub mod clock;
pub mod config;
pub mod contact;
pub mod decision;
pub mod fusion;
pub mod interface;
pub mod risk;
pub mod stats;
pub mod system;
pub mod telemetry;
pub mod validation;

pub use config::PipelineConfig;
pub use system::{AdvisoryPipeline, CycleInput, StateSnapshot};

/// Common error type for pipeline construction and execution.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

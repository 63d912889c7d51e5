//! Advisory threat assessment.
//!
//! Scores established tracks on additive risk factors and produces ranked,
//! explained assessments. Nothing here acts; every output is advice for a
//! human reviewer.

mod engine;
mod factors;

pub use engine::ThreatAssessor;
pub use factors::{RiskFactor, RiskScore, ThreatAssessment, Zone};

//! Statistical anomaly monitoring.
//!
//! One generic detector runs the shared baseline / Z-score / CUSUM / EWMA
//! machinery; a [`MetricDomain`] plugs in what to measure and which
//! domain-specific indicators to evaluate alongside it.

mod access;
mod airspace;
mod detector;
mod spectrum;

pub use access::{AccessDomain, AccessEvent};
pub use airspace::AirspaceDomain;
pub use detector::{AnomalyDetector, AnomalyReport, MetricDomain, Trigger};
pub use spectrum::{SpectrumDomain, SpectrumFrame};

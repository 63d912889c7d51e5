//! Multi-sensor track fusion.
//!
//! Detections that survive the validation gate are associated into tracks by
//! nearest-neighbor gating; tracks decay in confidence while unrefreshed and
//! are evicted once long stale.

mod track;
mod tracker;

pub use track::{Classification, ThreatLevel, Track};
pub use tracker::{TrackStore, Tracker};

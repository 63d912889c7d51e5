use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::contact::{Detection, Position, SensorKind, Velocity};

/// Identity assessment of a track based on IFF responses and kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    Friendly,
    Civilian,
    Unknown,
    Hostile,
}

/// Assessed threat severity, ordered from benign to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::None => "NONE",
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        }
    }
}

/// A fused object hypothesis built from one or more detections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub position: Position,
    pub velocity: Velocity,
    pub classification: Classification,
    /// Confidence as of `last_updated`; read through
    /// [`Track::effective_confidence`] for the decayed value.
    pub confidence: f64,
    pub first_seen: f64,
    pub last_updated: f64,
    pub update_count: u32,
    pub last_sensor: SensorKind,
    /// Recent supporting detections, oldest first.
    #[serde(skip)]
    pub history: VecDeque<Detection>,
}

impl Track {
    pub fn speed(&self) -> f64 {
        self.velocity.speed()
    }

    /// Confidence with linear decay applied since the last refresh.
    ///
    /// Computed from the stored anchor each time instead of mutating in
    /// place, so repeated reads at the same instant agree.
    pub fn effective_confidence(&self, now: f64, decay_per_sec: f64) -> f64 {
        let elapsed = (now - self.last_updated).max(0.0);
        (self.confidence - decay_per_sec * elapsed).clamp(0.0, 1.0)
    }

    pub fn time_since_update(&self, now: f64) -> f64 {
        (now - self.last_updated).max(0.0)
    }

    pub fn is_stale(&self, now: f64, stale_after_secs: f64) -> bool {
        self.time_since_update(now) > stale_after_secs
    }
}

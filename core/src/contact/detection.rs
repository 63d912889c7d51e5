use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geometry::{Position, Velocity};

/// Sensor modality that produced a detection.
///
/// Closed set: an unrecognized modality in a feed is a validation failure,
/// not a new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Radar,
    Iff,
    Optical,
    Acoustic,
}

impl SensorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorKind::Radar => "radar",
            SensorKind::Iff => "iff",
            SensorKind::Optical => "optical",
            SensorKind::Acoustic => "acoustic",
        }
    }
}

/// A single raw sensor report, as received from a feed.
///
/// Optional fields are backfilled by the validation gate before the
/// detection enters the fusion stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub sensor_id: String,
    pub sensor_kind: SensorKind,
    /// Epoch seconds.
    pub timestamp: f64,
    pub position: Position,
    #[serde(default)]
    pub velocity: Option<Velocity>,
    /// Normalized to [0, 1] by the feed.
    #[serde(default)]
    pub signal_strength: Option<f64>,
    /// Positional uncertainty in [0, 1]; 0 is exact.
    #[serde(default)]
    pub uncertainty: Option<f64>,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Detection {
    pub fn new(
        sensor_id: impl Into<String>,
        sensor_kind: SensorKind,
        timestamp: f64,
        position: Position,
        confidence: f64,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sensor_kind,
            timestamp,
            position,
            velocity: None,
            signal_strength: None,
            uncertainty: None,
            confidence,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = Some(velocity);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

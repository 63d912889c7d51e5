//! Sensor contact data model: geometry primitives and raw detections.

mod detection;
mod geometry;

pub use detection::{Detection, SensorKind};
pub use geometry::{heading_off_origin_deg, Position, Velocity};

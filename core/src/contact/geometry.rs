use serde::{Deserialize, Serialize};

/// Cartesian position in meters, origin at the protected site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Slant range from the protected site.
    pub fn range_from_origin(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Velocity vector in meters per second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { vx: 0.0, vy: 0.0, vz: 0.0 };

    pub fn new(vx: f64, vy: f64, vz: f64) -> Self {
        Self { vx, vy, vz }
    }

    pub fn speed(&self) -> f64 {
        (self.vx * self.vx + self.vy * self.vy + self.vz * self.vz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.vx.is_finite() && self.vy.is_finite() && self.vz.is_finite()
    }
}

/// Angle in degrees between the horizontal velocity and the bearing toward the
/// origin. Zero means flying straight at the protected site.
pub fn heading_off_origin_deg(position: &Position, velocity: &Velocity) -> Option<f64> {
    let to_origin = (-position.x, -position.y);
    let range = (to_origin.0 * to_origin.0 + to_origin.1 * to_origin.1).sqrt();
    let speed = (velocity.vx * velocity.vx + velocity.vy * velocity.vy).sqrt();
    if range < 1e-6 || speed < 1e-6 {
        return None;
    }
    let dot = to_origin.0 * velocity.vx + to_origin.1 * velocity.vy;
    let cos = (dot / (range * speed)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_symmetric() {
        let a = Position::new(0.0, 0.0, 0.0);
        let b = Position::new(3.0, 4.0, 0.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn heading_toward_origin_is_zero_degrees() {
        let pos = Position::new(10_000.0, 0.0, 1_000.0);
        let vel = Velocity::new(-200.0, 0.0, 0.0);
        let angle = heading_off_origin_deg(&pos, &vel).unwrap();
        assert!(angle.abs() < 1e-9);
    }

    #[test]
    fn heading_away_from_origin_is_180_degrees() {
        let pos = Position::new(10_000.0, 0.0, 0.0);
        let vel = Velocity::new(200.0, 0.0, 0.0);
        let angle = heading_off_origin_deg(&pos, &vel).unwrap();
        assert!((angle - 180.0).abs() < 1e-9);
    }

    #[test]
    fn heading_undefined_when_stationary() {
        let pos = Position::new(10_000.0, 0.0, 0.0);
        assert!(heading_off_origin_deg(&pos, &Velocity::ZERO).is_none());
    }
}

use log::{debug, warn};

use crate::config::PipelineConfig;
use crate::contact::{Detection, Velocity};

/// A rejected detection together with every reason it failed.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub detection: Detection,
    pub reasons: Vec<String>,
}

/// Result of validating a batch of detections.
#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub accepted: Vec<Detection>,
    pub rejected: Vec<ValidationFailure>,
    /// Soft findings on accepted detections.
    pub warnings: Vec<String>,
}

/// Validates raw detections against structural and physical bounds, then
/// backfills missing optional fields.
pub struct ValidationGate {
    max_age_secs: f64,
    horizontal_bound_m: f64,
    min_altitude_m: f64,
    max_altitude_m: f64,
    max_plausible_speed_mps: f64,
    reject_on_warning: bool,
}

impl ValidationGate {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_age_secs: config.max_detection_age_secs,
            horizontal_bound_m: config.horizontal_bound_m,
            min_altitude_m: config.min_altitude_m,
            max_altitude_m: config.max_altitude_m,
            max_plausible_speed_mps: config.max_plausible_speed_mps,
            reject_on_warning: config.reject_on_warning,
        }
    }

    /// Validates one detection. On success, returns the detection with
    /// optional fields backfilled; on failure, the full list of reasons.
    pub fn check(&self, detection: &Detection, now: f64) -> Result<Detection, Vec<String>> {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        self.inspect(detection, now, &mut errors, &mut warnings);

        if self.reject_on_warning {
            errors.extend(warnings);
        } else {
            for warning in &warnings {
                warn!("detection {}: {}", detection.sensor_id, warning);
            }
        }

        if errors.is_empty() {
            Ok(Self::backfill(detection.clone()))
        } else {
            Err(errors)
        }
    }

    /// Validates a whole cycle's input. Rejections are collected, never
    /// propagated as errors.
    pub fn check_batch(&self, detections: &[Detection], now: f64) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        for detection in detections {
            let mut errors = Vec::new();
            let mut warnings = Vec::new();
            self.inspect(detection, now, &mut errors, &mut warnings);

            if self.reject_on_warning {
                errors.append(&mut warnings);
            }
            if errors.is_empty() {
                for warning in warnings {
                    outcome
                        .warnings
                        .push(format!("{}: {}", detection.sensor_id, warning));
                }
                outcome.accepted.push(Self::backfill(detection.clone()));
            } else {
                debug!(
                    "rejecting detection from {}: {}",
                    detection.sensor_id,
                    errors.join("; ")
                );
                outcome.rejected.push(ValidationFailure {
                    detection: detection.clone(),
                    reasons: errors,
                });
            }
        }
        outcome
    }

    fn inspect(
        &self,
        det: &Detection,
        now: f64,
        errors: &mut Vec<String>,
        warnings: &mut Vec<String>,
    ) {
        if det.sensor_id.trim().is_empty() {
            errors.push("empty sensor_id".into());
        }

        if !det.timestamp.is_finite() {
            errors.push("non-finite timestamp".into());
        } else {
            let age = now - det.timestamp;
            if age > self.max_age_secs {
                errors.push(format!(
                    "detection is {age:.1}s old, limit {:.1}s",
                    self.max_age_secs
                ));
            } else if age < 0.0 {
                warnings.push(format!("timestamp {:.1}s in the future", -age));
            }
        }

        if !det.position.is_finite() {
            errors.push("non-finite position".into());
        } else {
            if det.position.x.abs() > self.horizontal_bound_m
                || det.position.y.abs() > self.horizontal_bound_m
            {
                errors.push(format!(
                    "position outside horizontal bounds +/-{:.0}m",
                    self.horizontal_bound_m
                ));
            }
            if det.position.z < self.min_altitude_m || det.position.z > self.max_altitude_m {
                errors.push(format!(
                    "altitude {:.0}m outside [{:.0}, {:.0}]",
                    det.position.z, self.min_altitude_m, self.max_altitude_m
                ));
            }
        }

        if let Some(vel) = &det.velocity {
            if !vel.is_finite() {
                errors.push("non-finite velocity".into());
            } else {
                let worst = vel.vx.abs().max(vel.vy.abs()).max(vel.vz.abs());
                if worst > self.max_plausible_speed_mps {
                    warnings.push(format!(
                        "velocity component {worst:.0} m/s exceeds plausibility limit {:.0} m/s",
                        self.max_plausible_speed_mps
                    ));
                }
            }
        }

        if !(0.0..=1.0).contains(&det.confidence) || !det.confidence.is_finite() {
            errors.push(format!("confidence {} outside [0, 1]", det.confidence));
        }
        if let Some(s) = det.signal_strength {
            if !(0.0..=1.0).contains(&s) || !s.is_finite() {
                errors.push(format!("signal_strength {s} outside [0, 1]"));
            }
        }
        if let Some(u) = det.uncertainty {
            if !(0.0..=1.0).contains(&u) || !u.is_finite() {
                errors.push(format!("uncertainty {u} outside [0, 1]"));
            }
        }
    }

    /// Fills optional fields so downstream stages never branch on absence.
    fn backfill(mut det: Detection) -> Detection {
        if det.velocity.is_none() {
            det.velocity = Some(Velocity::ZERO);
        }
        if det.signal_strength.is_none() {
            det.signal_strength = Some(det.confidence);
        }
        if det.uncertainty.is_none() {
            det.uncertainty = Some(1.0 - det.confidence);
        }
        det
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Position, SensorKind};

    fn gate() -> ValidationGate {
        ValidationGate::new(&PipelineConfig::default())
    }

    fn valid_detection(now: f64) -> Detection {
        Detection::new(
            "radar-1",
            SensorKind::Radar,
            now - 1.0,
            Position::new(10_000.0, 5_000.0, 2_000.0),
            0.8,
        )
    }

    #[test]
    fn accepts_and_backfills_a_valid_detection() {
        let now = 1_000.0;
        let det = gate().check(&valid_detection(now), now).unwrap();
        assert_eq!(det.velocity.unwrap(), Velocity::ZERO);
        assert_eq!(det.signal_strength.unwrap(), 0.8);
        assert!((det.uncertainty.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn rejects_stale_detection() {
        let now = 1_000.0;
        let mut det = valid_detection(now);
        det.timestamp = now - 11.0;
        let reasons = gate().check(&det, now).unwrap_err();
        assert!(reasons[0].contains("old"));
    }

    #[test]
    fn future_timestamp_is_a_warning_not_a_reject() {
        let now = 1_000.0;
        let mut det = valid_detection(now);
        det.timestamp = now + 5.0;
        assert!(gate().check(&det, now).is_ok());

        let strict = ValidationGate::new(&PipelineConfig {
            reject_on_warning: true,
            ..Default::default()
        });
        assert!(strict.check(&det, now).is_err());
    }

    #[test]
    fn rejects_out_of_bounds_position() {
        let now = 1_000.0;
        let mut det = valid_detection(now);
        det.position.x = 1_500_000.0;
        assert!(gate().check(&det, now).is_err());

        let mut det = valid_detection(now);
        det.position.z = 250_000.0;
        assert!(gate().check(&det, now).is_err());
    }

    #[test]
    fn rejects_non_finite_fields() {
        let now = 1_000.0;
        let mut det = valid_detection(now);
        det.position.y = f64::NAN;
        assert!(gate().check(&det, now).is_err());

        let mut det = valid_detection(now);
        det.confidence = f64::INFINITY;
        assert!(gate().check(&det, now).is_err());
    }

    #[test]
    fn implausible_velocity_is_a_warning() {
        let now = 1_000.0;
        let det = valid_detection(now).with_velocity(Velocity::new(1_500.0, 0.0, 0.0));
        let checked = gate().check(&det, now).unwrap();
        // The value survives; the gate only flags it.
        assert_eq!(checked.velocity.unwrap().vx, 1_500.0);
    }

    #[test]
    fn batch_partitions_good_and_bad() {
        let now = 1_000.0;
        let good = valid_detection(now);
        let mut bad = valid_detection(now);
        bad.confidence = 1.5;

        let outcome = gate().check_batch(&[good, bad], now);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.rejected.len(), 1);
        assert!(outcome.rejected[0].reasons[0].contains("confidence"));
    }

    #[test]
    fn supplied_optionals_are_not_overwritten() {
        let now = 1_000.0;
        let mut det = valid_detection(now);
        det.uncertainty = Some(0.05);
        det.signal_strength = Some(0.4);
        let checked = gate().check(&det, now).unwrap();
        assert_eq!(checked.uncertainty.unwrap(), 0.05);
        assert_eq!(checked.signal_strength.unwrap(), 0.4);
    }
}

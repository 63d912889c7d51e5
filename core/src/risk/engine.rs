use log::debug;

use crate::config::PipelineConfig;
use crate::contact::heading_off_origin_deg;
use crate::fusion::{Classification, ThreatLevel, Track};

use super::factors::{RiskFactor, RiskScore, ThreatAssessment, Zone};

/// Scores tracks and maps them to advisory threat levels.
pub struct ThreatAssessor {
    critical_zone_m: f64,
    protected_zone_m: f64,
    extended_zone_m: f64,
    hostile_speed_mps: f64,
    civilian_speed_mps: f64,
    min_confidence: f64,
    decay_per_sec: f64,
    stale_after_secs: f64,
}

impl ThreatAssessor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            critical_zone_m: config.critical_zone_radius_m,
            protected_zone_m: config.protected_zone_radius_m,
            extended_zone_m: config.extended_zone_radius_m,
            hostile_speed_mps: config.hostile_speed_mps,
            civilian_speed_mps: config.civilian_speed_mps,
            min_confidence: config.min_assessment_confidence,
            decay_per_sec: config.confidence_decay_per_sec,
            stale_after_secs: config.stale_after_secs,
        }
    }

    /// Assesses every track; output sorted most severe first.
    pub fn assess_all(&self, tracks: &[Track], now: f64) -> Vec<ThreatAssessment> {
        let mut assessments: Vec<ThreatAssessment> =
            tracks.iter().map(|t| self.assess(t, now)).collect();
        assessments.sort_by(|a, b| {
            b.threat_level
                .cmp(&a.threat_level)
                .then(b.risk.score.total_cmp(&a.risk.score))
        });
        assessments
    }

    pub fn assess(&self, track: &Track, now: f64) -> ThreatAssessment {
        let range = track.position.range_from_origin();
        let zone = self.zone_for(range);
        let track_confidence = track.effective_confidence(now, self.decay_per_sec);

        let mut reasoning = Vec::new();
        let mut factors = Vec::new();

        self.classification_factor(track, &mut factors);
        self.zone_factor(zone, range, &mut factors);
        self.trajectory_factor(track, &mut factors);
        self.speed_factor(track, &mut factors);

        let raw: f64 = factors.iter().map(RiskFactor::contribution).sum();
        let score = raw.clamp(0.0, 1.0);
        for factor in &factors {
            reasoning.push(format!(
                "{} +{:.2}: {}",
                factor.name,
                factor.contribution(),
                factor.rationale
            ));
        }

        // Low-confidence tracks never escalate; the evidence is too thin to
        // put in front of an operator as a threat.
        let threat_level = if track_confidence < self.min_confidence {
            reasoning.push(format!(
                "track confidence {track_confidence:.2} below assessment floor {:.2}, threat level forced to NONE",
                self.min_confidence
            ));
            ThreatLevel::None
        } else {
            Self::level_for(score)
        };

        let uncertainty = self.uncertainty(track, track_confidence, now);
        let spread = uncertainty * score;
        let probability = Self::probability(threat_level, track.classification, track_confidence);
        let confidence = Self::assessment_confidence(threat_level, track.classification, track_confidence);

        reasoning.push(format!(
            "score {score:.2} in zone {} at range {:.1} km",
            zone.as_str(),
            range / 1_000.0
        ));
        debug!(
            "assessed {} as {} (score {:.2}, p {:.2})",
            track.id,
            threat_level.as_str(),
            score,
            probability
        );

        ThreatAssessment {
            track_id: track.id.clone(),
            threat_level,
            zone,
            risk: RiskScore {
                score,
                factors,
                uncertainty,
                lower_bound: (score - spread).clamp(0.0, 1.0),
                upper_bound: (score + spread).clamp(0.0, 1.0),
            },
            probability,
            confidence,
            reasoning,
            timestamp: now,
        }
    }

    fn zone_for(&self, range: f64) -> Zone {
        if range <= self.critical_zone_m {
            Zone::Critical
        } else if range <= self.protected_zone_m {
            Zone::Protected
        } else if range <= self.extended_zone_m {
            Zone::Extended
        } else {
            Zone::Outside
        }
    }

    fn classification_factor(&self, track: &Track, factors: &mut Vec<RiskFactor>) {
        let (value, rationale) = match track.classification {
            Classification::Hostile => (1.0, "classified hostile"),
            Classification::Unknown => (0.5, "unidentified contact"),
            Classification::Civilian => (0.15, "civilian traffic"),
            Classification::Friendly => (0.0, "friendly IFF"),
        };
        if value > 0.0 {
            factors.push(RiskFactor {
                name: "classification",
                value,
                weight: 0.6,
                rationale: rationale.into(),
            });
        }
    }

    fn zone_factor(&self, zone: Zone, range: f64, factors: &mut Vec<RiskFactor>) {
        let value = match zone {
            Zone::Critical => 1.0,
            Zone::Protected => 0.6,
            Zone::Extended => 0.25,
            Zone::Outside => 0.0,
        };
        if value > 0.0 {
            factors.push(RiskFactor {
                name: "zone",
                value,
                weight: 0.4,
                rationale: format!("{} zone at {:.1} km", zone.as_str(), range / 1_000.0),
            });
        }
    }

    fn trajectory_factor(&self, track: &Track, factors: &mut Vec<RiskFactor>) {
        let Some(angle) = heading_off_origin_deg(&track.position, &track.velocity) else {
            return;
        };
        let value = if angle < 30.0 {
            1.0
        } else if angle < 60.0 {
            0.5
        } else {
            0.0
        };
        if value > 0.0 {
            factors.push(RiskFactor {
                name: "trajectory",
                value,
                weight: 0.2,
                rationale: format!("inbound, {angle:.0} degrees off the site bearing"),
            });
        }
    }

    fn speed_factor(&self, track: &Track, factors: &mut Vec<RiskFactor>) {
        let speed = track.speed();
        let value = if speed >= self.hostile_speed_mps {
            1.0
        } else if speed > self.civilian_speed_mps {
            0.4
        } else {
            0.0
        };
        if value > 0.0 {
            factors.push(RiskFactor {
                name: "speed",
                value,
                weight: 0.15,
                rationale: format!("{speed:.0} m/s"),
            });
        }
    }

    /// Fixed cut points; a score exactly on a cut point takes the lower
    /// level.
    fn level_for(score: f64) -> ThreatLevel {
        if score > 0.95 {
            ThreatLevel::Critical
        } else if score > 0.8 {
            ThreatLevel::High
        } else if score > 0.6 {
            ThreatLevel::Medium
        } else if score > 0.3 {
            ThreatLevel::Low
        } else {
            ThreatLevel::None
        }
    }

    fn uncertainty(&self, track: &Track, track_confidence: f64, now: f64) -> f64 {
        let positional = track
            .history
            .back()
            .and_then(|d| d.uncertainty)
            .unwrap_or(1.0 - track_confidence);
        let age_ratio = (track.time_since_update(now) / self.stale_after_secs).clamp(0.0, 1.0);
        (0.4 * (1.0 - track_confidence) + 0.3 * age_ratio + 0.3 * positional).clamp(0.0, 1.0)
    }

    fn probability(level: ThreatLevel, classification: Classification, confidence: f64) -> f64 {
        let base = match level {
            ThreatLevel::Critical => 0.7,
            ThreatLevel::High => 0.5,
            ThreatLevel::Medium => 0.3,
            ThreatLevel::Low => 0.15,
            ThreatLevel::None => 0.05,
        };
        let adjusted = match classification {
            Classification::Hostile => base + 0.2,
            Classification::Unknown => base + 0.1,
            Classification::Friendly => base * 0.1,
            Classification::Civilian => base,
        };
        (adjusted * (0.5 + 0.5 * confidence)).clamp(0.0, 1.0)
    }

    fn assessment_confidence(
        level: ThreatLevel,
        classification: Classification,
        track_confidence: f64,
    ) -> f64 {
        let boost = match level {
            ThreatLevel::Critical => 0.3,
            ThreatLevel::High => 0.2,
            ThreatLevel::Medium => 0.1,
            ThreatLevel::Low => 0.05,
            ThreatLevel::None => 0.0,
        };
        let identified = if classification == Classification::Unknown { 0.0 } else { 0.1 };
        (0.6 * track_confidence + boost + identified).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Position, SensorKind, Velocity};
    use std::collections::VecDeque;

    fn track(
        classification: Classification,
        position: Position,
        velocity: Velocity,
        confidence: f64,
        now: f64,
    ) -> Track {
        Track {
            id: "TRK-0001".into(),
            position,
            velocity,
            classification,
            confidence,
            first_seen: now - 10.0,
            last_updated: now,
            update_count: 5,
            last_sensor: SensorKind::Radar,
            history: VecDeque::new(),
        }
    }

    fn assessor() -> ThreatAssessor {
        ThreatAssessor::new(&PipelineConfig::default())
    }

    #[test]
    fn hostile_in_critical_zone_is_critical() {
        let now = 1_000.0;
        let t = track(
            Classification::Hostile,
            Position::new(10_000.0, 0.0, 2_000.0),
            Velocity::new(-250.0, 0.0, 0.0),
            0.9,
            now,
        );
        let assessment = assessor().assess(&t, now);
        assert!(assessment.risk.score >= 0.95);
        assert_eq!(assessment.threat_level, ThreatLevel::Critical);
        assert_eq!(assessment.zone, Zone::Critical);
        assert!(assessment.requires_review());
    }

    #[test]
    fn friendly_far_out_is_none() {
        let now = 1_000.0;
        let t = track(
            Classification::Friendly,
            Position::new(150_000.0, 0.0, 10_000.0),
            Velocity::new(50.0, 0.0, 0.0),
            0.9,
            now,
        );
        let assessment = assessor().assess(&t, now);
        assert_eq!(assessment.threat_level, ThreatLevel::None);
        assert!(assessment.probability < 0.1);
    }

    #[test]
    fn low_confidence_forces_threat_level_none() {
        let now = 1_000.0;
        let t = track(
            Classification::Hostile,
            Position::new(10_000.0, 0.0, 2_000.0),
            Velocity::new(-400.0, 0.0, 0.0),
            0.5,
            now,
        );
        let assessment = assessor().assess(&t, now);
        assert_eq!(assessment.threat_level, ThreatLevel::None);
        // The score itself is still reported for the audit trail.
        assert!(assessment.risk.score >= 0.95);
        assert!(assessment
            .reasoning
            .iter()
            .any(|r| r.contains("below assessment floor")));
    }

    #[test]
    fn unknown_inbound_in_protected_zone_is_elevated() {
        let now = 1_000.0;
        let t = track(
            Classification::Unknown,
            Position::new(40_000.0, 0.0, 3_000.0),
            Velocity::new(-90.0, 0.0, 0.0),
            0.85,
            now,
        );
        let assessment = assessor().assess(&t, now);
        // 0.30 classification + 0.24 zone + 0.20 trajectory
        assert!((assessment.risk.score - 0.74).abs() < 1e-9);
        assert_eq!(assessment.threat_level, ThreatLevel::Medium);
    }

    #[test]
    fn scores_on_a_cut_point_take_the_lower_level() {
        assert_eq!(ThreatAssessor::level_for(0.3), ThreatLevel::None);
        assert_eq!(ThreatAssessor::level_for(0.6), ThreatLevel::Low);
        assert_eq!(ThreatAssessor::level_for(0.8), ThreatLevel::Medium);
        assert_eq!(ThreatAssessor::level_for(0.95), ThreatLevel::High);
        assert_eq!(ThreatAssessor::level_for(0.951), ThreatLevel::Critical);
    }

    #[test]
    fn bounds_bracket_the_score() {
        let now = 1_000.0;
        let t = track(
            Classification::Unknown,
            Position::new(40_000.0, 0.0, 3_000.0),
            Velocity::new(-200.0, 0.0, 0.0),
            0.85,
            now,
        );
        let a = assessor().assess(&t, now);
        assert!(a.risk.lower_bound <= a.risk.score);
        assert!(a.risk.score <= a.risk.upper_bound);
        assert!(a.risk.upper_bound <= 1.0);
    }

    #[test]
    fn assessments_sort_most_severe_first() {
        let now = 1_000.0;
        let benign = track(
            Classification::Friendly,
            Position::new(150_000.0, 0.0, 10_000.0),
            Velocity::new(50.0, 0.0, 0.0),
            0.9,
            now,
        );
        let mut hostile = track(
            Classification::Hostile,
            Position::new(10_000.0, 0.0, 2_000.0),
            Velocity::new(-250.0, 0.0, 0.0),
            0.9,
            now,
        );
        hostile.id = "TRK-0002".into();
        let ordered = assessor().assess_all(&[benign, hostile], now);
        assert_eq!(ordered[0].track_id, "TRK-0002");
        assert_eq!(ordered[0].threat_level, ThreatLevel::Critical);
    }

    #[test]
    fn probability_scales_with_confidence() {
        let now = 1_000.0;
        let mk = |conf| {
            track(
                Classification::Hostile,
                Position::new(10_000.0, 0.0, 2_000.0),
                Velocity::new(-250.0, 0.0, 0.0),
                conf,
                now,
            )
        };
        let high = assessor().assess(&mk(0.95), now);
        let low = assessor().assess(&mk(0.75), now);
        assert!(high.probability > low.probability);
    }
}

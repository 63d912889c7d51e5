use log::{info, warn};

use crate::anomaly::AnomalyReport;
use crate::config::PipelineConfig;
use crate::fusion::{Classification, Track};
use crate::risk::{ThreatAssessment, Zone};

use super::state::{
    AdvisoryState, ApprovalRequired, HumanReviewState, NoAction, Recommendation, SystemMode,
};

/// Everything the aggregator sees for one cycle.
pub struct DecisionInputs<'a> {
    pub operator_present: bool,
    pub tracks: &'a [Track],
    pub assessments: &'a [ThreatAssessment],
    pub anomalies: &'a [AnomalyReport],
    pub now: f64,
}

/// One cycle's aggregated output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DecisionResult {
    pub state: AdvisoryState,
    pub recommendations: Vec<Recommendation>,
}

/// Folds per-track assessments and domain anomaly reports into a single
/// advisory posture, most conservative condition first.
pub struct DecisionAggregator {
    max_uncertainty: f64,
    max_data_age_secs: f64,
    min_confidence: f64,
    last_mode: Option<SystemMode>,
}

impl DecisionAggregator {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            max_uncertainty: config.max_uncertainty,
            max_data_age_secs: config.max_data_age_secs,
            min_confidence: config.min_assessment_confidence,
            last_mode: None,
        }
    }

    pub fn decide(&mut self, inputs: DecisionInputs<'_>) -> DecisionResult {
        let mut reasoning = Vec::new();

        let aggregate_uncertainty =
            Self::aggregate_uncertainty(inputs.tracks, inputs.assessments);
        let stale_data = inputs
            .tracks
            .iter()
            .any(|t| t.time_since_update(inputs.now) > self.max_data_age_secs);
        if stale_data {
            reasoning.push("track data older than the staleness limit".into());
        }

        let anomalies: Vec<String> = inputs
            .anomalies
            .iter()
            .filter(|r| r.anomalous)
            .map(|r| format!("{} anomaly, score {:.2}", r.domain, r.score))
            .collect();
        for finding in &anomalies {
            warn!("{finding}");
        }

        let airspace_violations = Self::violations(inputs.tracks, inputs.assessments);

        let needs_review = inputs.assessments.iter().any(ThreatAssessment::requires_review);
        let low_confidence_share = if inputs.tracks.is_empty() {
            0.0
        } else {
            inputs
                .tracks
                .iter()
                .filter(|t| t.confidence < self.min_confidence)
                .count() as f64
                / inputs.tracks.len() as f64
        };

        // Three independent degraded-evidence conditions; the flag never
        // changes the mode by itself.
        let fail_safe = aggregate_uncertainty > self.max_uncertainty
            || low_confidence_share > 0.5
            || stale_data;

        // Conditions are checked most conservative first; the first match
        // decides the mode.
        let mode = if !inputs.operator_present {
            reasoning.push("no operator on console, withholding all recommendations".into());
            SystemMode::DegradedSafe
        } else if inputs.tracks.is_empty() {
            reasoning.push("no established tracks, nothing to advise on".into());
            SystemMode::MonitoringOnly
        } else if aggregate_uncertainty > self.max_uncertainty {
            reasoning.push(format!(
                "aggregate uncertainty {aggregate_uncertainty:.2} above limit {:.2}",
                self.max_uncertainty
            ));
            SystemMode::MonitoringOnly
        } else if needs_review {
            reasoning.push("at least one assessment at HIGH or above".into());
            SystemMode::HumanApprovalRequired
        } else if low_confidence_share > 0.5 {
            reasoning.push(format!(
                "{:.0}% of tracks below the confidence floor",
                low_confidence_share * 100.0
            ));
            SystemMode::MonitoringOnly
        } else {
            SystemMode::AdvisoryRecommendation
        };

        if self.last_mode != Some(mode) {
            info!(
                "mode {} -> {}",
                self.last_mode.map_or("(start)", |m| m.as_str()),
                mode.as_str()
            );
            self.last_mode = Some(mode);
        }

        let recommendations = if mode == SystemMode::HumanApprovalRequired {
            Self::recommendations(inputs.assessments)
        } else {
            Vec::new()
        };
        let review = if mode == SystemMode::HumanApprovalRequired {
            HumanReviewState::Pending
        } else {
            HumanReviewState::NotRequired
        };

        DecisionResult {
            state: AdvisoryState {
                mode,
                review,
                default_action: NoAction,
                fail_safe,
                aggregate_uncertainty,
                airspace_violations,
                anomalies,
                reasoning,
                timestamp: inputs.now,
            },
            recommendations,
        }
    }

    /// Weighted blend of track-confidence shortfall and assessment
    /// uncertainty. An empty cycle reads as maximally uncertain.
    fn aggregate_uncertainty(tracks: &[Track], assessments: &[ThreatAssessment]) -> f64 {
        let mean_track_confidence = if tracks.is_empty() {
            0.0
        } else {
            tracks.iter().map(|t| t.confidence).sum::<f64>() / tracks.len() as f64
        };
        let mean_assessment_uncertainty = if assessments.is_empty() {
            1.0
        } else {
            assessments.iter().map(|a| a.risk.uncertainty).sum::<f64>() / assessments.len() as f64
        };
        (0.6 * (1.0 - mean_track_confidence) + 0.4 * mean_assessment_uncertainty).clamp(0.0, 1.0)
    }

    /// Non-friendly presence inside the protected or critical zone.
    fn violations(tracks: &[Track], assessments: &[ThreatAssessment]) -> Vec<String> {
        assessments
            .iter()
            .filter(|a| matches!(a.zone, Zone::Critical | Zone::Protected))
            .filter(|a| {
                tracks
                    .iter()
                    .find(|t| t.id == a.track_id)
                    .map_or(true, |t| t.classification != Classification::Friendly)
            })
            .map(|a| format!("{} inside {} zone", a.track_id, a.zone.as_str()))
            .collect()
    }

    fn recommendations(assessments: &[ThreatAssessment]) -> Vec<Recommendation> {
        assessments
            .iter()
            .filter(|a| a.requires_review())
            .map(|a| Recommendation {
                track_id: a.track_id.clone(),
                threat_level: a.threat_level,
                summary: format!(
                    "{} assessed {} (score {:.2}, p {:.2}); review and acknowledge",
                    a.track_id,
                    a.threat_level.as_str(),
                    a.risk.score,
                    a.probability
                ),
                action: NoAction,
                approval_required: ApprovalRequired,
                confidence: a.confidence,
                review: HumanReviewState::Pending,
            })
            .collect()
    }

    /// Applies an operator's verdict to a pending recommendation.
    pub fn apply_review(recommendation: &mut Recommendation, approved: bool) {
        recommendation.review = if approved {
            HumanReviewState::Approved
        } else {
            HumanReviewState::Rejected
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::{Position, SensorKind, Velocity};
    use crate::fusion::ThreatLevel;
    use crate::risk::ThreatAssessor;
    use std::collections::VecDeque;

    fn track(id: &str, classification: Classification, x: f64, confidence: f64, now: f64) -> Track {
        Track {
            id: id.into(),
            position: Position::new(x, 0.0, 2_000.0),
            velocity: Velocity::new(-200.0, 0.0, 0.0),
            classification,
            confidence,
            first_seen: now - 20.0,
            last_updated: now,
            update_count: 5,
            last_sensor: SensorKind::Radar,
            history: VecDeque::new(),
        }
    }

    fn aggregator() -> DecisionAggregator {
        DecisionAggregator::new(&PipelineConfig::default())
    }

    fn assess(tracks: &[Track], now: f64) -> Vec<ThreatAssessment> {
        ThreatAssessor::new(&PipelineConfig::default()).assess_all(tracks, now)
    }

    #[test]
    fn no_operator_wins_over_everything() {
        let now = 1_000.0;
        let tracks = vec![track("TRK-0001", Classification::Hostile, 10_000.0, 0.9, now)];
        let assessments = assess(&tracks, now);
        let result = aggregator().decide(DecisionInputs {
            operator_present: false,
            tracks: &tracks,
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        assert_eq!(result.state.mode, SystemMode::DegradedSafe);
        assert_eq!(result.state.review, HumanReviewState::NotRequired);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn empty_track_set_is_monitoring_only() {
        let now = 1_000.0;
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &[],
            assessments: &[],
            anomalies: &[],
            now,
        });
        assert_eq!(result.state.mode, SystemMode::MonitoringOnly);
        // No data means maximal uncertainty, which also trips fail-safe.
        assert!(result.state.fail_safe);
    }

    #[test]
    fn high_threat_requires_human_approval() {
        let now = 1_000.0;
        let tracks = vec![track("TRK-0001", Classification::Hostile, 10_000.0, 0.9, now)];
        let assessments = assess(&tracks, now);
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &tracks,
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        assert_eq!(result.state.mode, SystemMode::HumanApprovalRequired);
        assert_eq!(result.state.review, HumanReviewState::Pending);
        assert_eq!(result.recommendations.len(), 1);
        let rec = &result.recommendations[0];
        assert_eq!(rec.threat_level, ThreatLevel::Critical);
        assert_eq!(rec.review, HumanReviewState::Pending);
        // Pinned literals: the recommendation cannot carry any other action.
        assert_eq!(serde_json::to_value(rec.action).unwrap(), "NO_ACTION");
        assert_eq!(serde_json::to_value(rec.approval_required).unwrap(), true);
    }

    #[test]
    fn benign_traffic_yields_advisory_mode() {
        let now = 1_000.0;
        let tracks = vec![track(
            "TRK-0001",
            Classification::Civilian,
            90_000.0,
            0.9,
            now,
        )];
        let assessments = assess(&tracks, now);
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &tracks,
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        assert_eq!(result.state.mode, SystemMode::AdvisoryRecommendation);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn stale_track_data_trips_fail_safe() {
        let now = 1_000.0;
        let mut stale = track("TRK-0001", Classification::Civilian, 90_000.0, 0.9, now);
        stale.last_updated = now - 40.0;
        let assessments = assess(&[stale.clone()], now);
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &[stale],
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        assert!(result.state.fail_safe);
    }

    #[test]
    fn low_confidence_tracks_degrade_to_monitoring() {
        let now = 1_000.0;
        let tracks = vec![track("TRK-0001", Classification::Unknown, 40_000.0, 0.5, now)];
        let assessments = assess(&tracks, now);
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &tracks,
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        assert_eq!(result.state.mode, SystemMode::MonitoringOnly);
        assert!(result.state.fail_safe);
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn hostile_in_critical_zone_is_a_violation() {
        let now = 1_000.0;
        let tracks = vec![track("TRK-0001", Classification::Hostile, 10_000.0, 0.9, now)];
        let assessments = assess(&tracks, now);
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &tracks,
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        assert_eq!(result.state.airspace_violations.len(), 1);
        assert!(result.state.airspace_violations[0].contains("CRITICAL"));
    }

    #[test]
    fn friendly_in_zone_is_not_a_violation() {
        let now = 1_000.0;
        let tracks = vec![track("TRK-0001", Classification::Friendly, 10_000.0, 0.9, now)];
        let assessments = assess(&tracks, now);
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &tracks,
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        assert!(result.state.airspace_violations.is_empty());
    }

    #[test]
    fn every_cycle_result_carries_the_default_action_literal() {
        let now = 1_000.0;
        // Monitoring mode, no recommendations: the pinned default must still
        // be on the wire.
        let result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &[],
            assessments: &[],
            anomalies: &[],
            now,
        });
        assert!(result.recommendations.is_empty());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["state"]["default_action"], "NO_ACTION");
    }

    #[test]
    fn review_verdict_moves_the_state() {
        let now = 1_000.0;
        let tracks = vec![track("TRK-0001", Classification::Hostile, 10_000.0, 0.9, now)];
        let assessments = assess(&tracks, now);
        let mut result = aggregator().decide(DecisionInputs {
            operator_present: true,
            tracks: &tracks,
            assessments: &assessments,
            anomalies: &[],
            now,
        });
        DecisionAggregator::apply_review(&mut result.recommendations[0], false);
        assert_eq!(result.recommendations[0].review, HumanReviewState::Rejected);
    }
}

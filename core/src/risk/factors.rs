use serde::Serialize;

use crate::fusion::ThreatLevel;

/// Protection zone a track currently occupies, by range from the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    Critical,
    Protected,
    Extended,
    Outside,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Critical => "CRITICAL",
            Zone::Protected => "PROTECTED",
            Zone::Extended => "EXTENDED",
            Zone::Outside => "OUTSIDE",
        }
    }
}

/// One named contribution to a track's risk score.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFactor {
    pub name: &'static str,
    /// Normalized severity in [0, 1].
    pub value: f64,
    /// Fixed per-factor weight in [0, 1].
    pub weight: f64,
    pub rationale: String,
}

impl RiskFactor {
    pub fn contribution(&self) -> f64 {
        self.value * self.weight
    }
}

/// Additive risk score with its contributing factors and uncertainty bounds.
#[derive(Debug, Clone, Serialize)]
pub struct RiskScore {
    /// Sum of factor contributions, clamped to [0, 1].
    pub score: f64,
    pub factors: Vec<RiskFactor>,
    pub uncertainty: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Full advisory assessment of one track.
#[derive(Debug, Clone, Serialize)]
pub struct ThreatAssessment {
    pub track_id: String,
    pub threat_level: ThreatLevel,
    pub zone: Zone,
    pub risk: RiskScore,
    /// Estimated probability the track is a genuine threat.
    pub probability: f64,
    /// Confidence in this assessment itself.
    pub confidence: f64,
    pub reasoning: Vec<String>,
    pub timestamp: f64,
}

impl ThreatAssessment {
    pub fn requires_review(&self) -> bool {
        self.threat_level >= ThreatLevel::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_required_from_high_upward() {
        let mk = |level| ThreatAssessment {
            track_id: "TRK-0001".into(),
            threat_level: level,
            zone: Zone::Extended,
            risk: RiskScore {
                score: 0.5,
                factors: Vec::new(),
                uncertainty: 0.1,
                lower_bound: 0.45,
                upper_bound: 0.55,
            },
            probability: 0.3,
            confidence: 0.8,
            reasoning: Vec::new(),
            timestamp: 0.0,
        };
        assert!(!mk(ThreatLevel::Medium).requires_review());
        assert!(mk(ThreatLevel::High).requires_review());
        assert!(mk(ThreatLevel::Critical).requires_review());
    }
}

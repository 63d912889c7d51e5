use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::fusion::ThreatLevel;

/// Overall posture the aggregator advises for the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemMode {
    /// Normal advisory output; nothing needs escalation.
    AdvisoryRecommendation,
    /// At least one assessment demands an operator's sign-off.
    HumanApprovalRequired,
    /// Evidence too thin or too uncertain to recommend anything.
    MonitoringOnly,
    /// No operator present; the system withholds all recommendations.
    DegradedSafe,
}

impl SystemMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemMode::AdvisoryRecommendation => "ADVISORY_RECOMMENDATION",
            SystemMode::HumanApprovalRequired => "HUMAN_APPROVAL_REQUIRED",
            SystemMode::MonitoringOnly => "MONITORING_ONLY",
            SystemMode::DegradedSafe => "DEGRADED_SAFE",
        }
    }
}

/// Where a recommendation stands in the human review flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HumanReviewState {
    NotRequired,
    Pending,
    Approved,
    Rejected,
}

/// The only action this system can recommend.
///
/// Unit type by construction: there is no variant carrying an engagement or
/// interdiction order, and the serialized form is pinned to the literal
/// string `"NO_ACTION"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoAction;

impl Serialize for NoAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("NO_ACTION")
    }
}

impl<'de> Deserialize<'de> for NoAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = NoAction;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("the string \"NO_ACTION\"")
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<NoAction, E> {
                if v == "NO_ACTION" {
                    Ok(NoAction)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }
        deserializer.deserialize_str(V)
    }
}

/// Marker pinned to the literal `true`: a recommendation that does not
/// require approval cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApprovalRequired;

impl Serialize for ApprovalRequired {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(true)
    }
}

impl<'de> Deserialize<'de> for ApprovalRequired {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = ApprovalRequired;
            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("the literal true")
            }
            fn visit_bool<E: de::Error>(self, v: bool) -> Result<ApprovalRequired, E> {
                if v {
                    Ok(ApprovalRequired)
                } else {
                    Err(E::invalid_value(de::Unexpected::Bool(v), &self))
                }
            }
        }
        deserializer.deserialize_bool(V)
    }
}

/// Advisory recommendation put in front of an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub track_id: String,
    pub threat_level: ThreatLevel,
    pub summary: String,
    pub action: NoAction,
    pub approval_required: ApprovalRequired,
    pub confidence: f64,
    pub review: HumanReviewState,
}

/// Aggregated advisory state for one cycle.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisoryState {
    pub mode: SystemMode,
    pub review: HumanReviewState,
    /// Pinned system-wide default; carried in every cycle regardless of mode.
    pub default_action: NoAction,
    /// Set whenever any degraded-evidence condition holds; conservative
    /// consumers treat the whole cycle as unreliable.
    pub fail_safe: bool,
    pub aggregate_uncertainty: f64,
    pub airspace_violations: Vec<String>,
    pub anomalies: Vec<String>,
    pub reasoning: Vec<String>,
    pub timestamp: f64,
}

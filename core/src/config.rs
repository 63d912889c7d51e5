use crate::{PipelineError, PipelineResult};
use serde::{Deserialize, Serialize};

/// Flat set of thresholds consumed by every pipeline component.
///
/// Constructor-injected and immutable for the lifetime of a pipeline
/// instance; there is no dynamic reconfiguration mid-cycle. The defaults are
/// the safe operating values the system was tuned with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    // Validation gate
    /// Detections older than this are rejected outright (seconds).
    pub max_detection_age_secs: f64,
    /// Symmetric x/y coordinate bound (meters).
    pub horizontal_bound_m: f64,
    /// Lower z bound (meters, below ground allowed for sensor error margins).
    pub min_altitude_m: f64,
    /// Upper z bound (meters).
    pub max_altitude_m: f64,
    /// Velocity components above this magnitude draw a warning, not a reject.
    pub max_plausible_speed_mps: f64,
    /// Treat warnings as rejections.
    pub reject_on_warning: bool,

    // Track fusion
    /// Association gating radius (meters).
    pub association_gate_m: f64,
    /// Linear confidence decay for unrefreshed tracks (per second).
    pub confidence_decay_per_sec: f64,
    /// A track is stale once unrefreshed for this long (seconds).
    pub stale_after_secs: f64,
    /// Stale tracks are evicted after this grace period (seconds).
    pub evict_after_secs: f64,
    /// Updates required before a track counts as established.
    pub min_updates_for_active: u32,
    /// Detection history retained per track.
    pub track_history_len: usize,

    // Risk scoring
    pub critical_zone_radius_m: f64,
    pub protected_zone_radius_m: f64,
    pub extended_zone_radius_m: f64,
    /// Speed above which kinematics read as hostile-capable (m/s).
    pub hostile_speed_mps: f64,
    /// Speed below which kinematics read as civilian traffic (m/s).
    pub civilian_speed_mps: f64,
    /// Below this track confidence the threat level is forced to NONE.
    pub min_assessment_confidence: f64,

    // Statistical anomaly framework
    pub baseline_min_samples: usize,
    pub baseline_window: usize,
    pub ewma_alpha: f64,
    pub cusum_threshold: f64,
    pub cusum_drift: f64,
    pub z_score_threshold: f64,
    /// Spectral entropy delta that counts as a structural change.
    pub entropy_spike_threshold: f64,
    /// Mean-power rise over baseline that counts as noise-floor elevation (dB).
    pub noise_floor_elevation_db: f64,
    /// Access-rate limit as a multiple of the baseline mean rate.
    pub rate_limit_multiplier: f64,

    // Decision aggregation
    /// Aggregate uncertainty above this forces MONITORING_ONLY.
    pub max_uncertainty: f64,
    /// Track data older than this trips the fail-safe flag (seconds).
    pub max_data_age_secs: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_detection_age_secs: 10.0,
            horizontal_bound_m: 1_000_000.0,
            min_altitude_m: -100_000.0,
            max_altitude_m: 200_000.0,
            max_plausible_speed_mps: 1_000.0,
            reject_on_warning: false,

            association_gate_m: 5_000.0,
            confidence_decay_per_sec: 0.01,
            stale_after_secs: 30.0,
            evict_after_secs: 60.0,
            min_updates_for_active: 3,
            track_history_len: 10,

            critical_zone_radius_m: 20_000.0,
            protected_zone_radius_m: 50_000.0,
            extended_zone_radius_m: 100_000.0,
            hostile_speed_mps: 300.0,
            civilian_speed_mps: 100.0,
            min_assessment_confidence: 0.7,

            baseline_min_samples: 10,
            baseline_window: 20,
            ewma_alpha: 0.3,
            cusum_threshold: 5.0,
            cusum_drift: 0.5,
            z_score_threshold: 2.0,
            entropy_spike_threshold: 0.3,
            noise_floor_elevation_db: 5.0,
            rate_limit_multiplier: 3.0,

            max_uncertainty: 0.3,
            max_data_age_secs: 30.0,
        }
    }
}

impl PipelineConfig {
    /// Rejects configurations that would undermine the fail-safe behavior.
    pub fn validate(&self) -> PipelineResult<()> {
        let unit_ranged = [
            ("min_assessment_confidence", self.min_assessment_confidence),
            ("max_uncertainty", self.max_uncertainty),
            ("ewma_alpha", self.ewma_alpha),
        ];
        for (name, value) in unit_ranged {
            if !(0.0..=1.0).contains(&value) {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be within [0.0, 1.0], got {value}"
                )));
            }
        }

        let positive = [
            ("max_detection_age_secs", self.max_detection_age_secs),
            ("association_gate_m", self.association_gate_m),
            ("stale_after_secs", self.stale_after_secs),
            ("evict_after_secs", self.evict_after_secs),
            ("critical_zone_radius_m", self.critical_zone_radius_m),
            ("protected_zone_radius_m", self.protected_zone_radius_m),
            ("extended_zone_radius_m", self.extended_zone_radius_m),
            ("cusum_threshold", self.cusum_threshold),
            ("z_score_threshold", self.z_score_threshold),
            ("rate_limit_multiplier", self.rate_limit_multiplier),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(PipelineError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }

        if self.evict_after_secs < self.stale_after_secs {
            return Err(PipelineError::InvalidConfig(
                "evict_after_secs must be at least stale_after_secs".into(),
            ));
        }
        if self.critical_zone_radius_m > self.protected_zone_radius_m
            || self.protected_zone_radius_m > self.extended_zone_radius_m
        {
            return Err(PipelineError::InvalidConfig(
                "zone radii must be ordered critical <= protected <= extended".into(),
            ));
        }
        if self.baseline_min_samples == 0 || self.baseline_window < self.baseline_min_samples {
            return Err(PipelineError::InvalidConfig(
                "baseline_window must hold at least baseline_min_samples samples".into(),
            ));
        }
        Ok(())
    }
}

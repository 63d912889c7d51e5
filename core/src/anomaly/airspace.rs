use crate::config::PipelineConfig;
use crate::fusion::Track;
use crate::stats::{z_score, BaselineWindow};

use super::detector::{MetricDomain, Trigger};

/// Airspace activity domain: the primary metric is the live track count;
/// indicators cover abnormal mean speed and converging geometry.
pub struct AirspaceDomain {
    speed_baseline: BaselineWindow,
    z_threshold: f64,
}

impl AirspaceDomain {
    /// Fraction of track pairs that must be closing before the pattern
    /// counts as coordinated convergence.
    const CONVERGING_FRACTION: f64 = 0.3;

    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            speed_baseline: BaselineWindow::new(
                config.baseline_window,
                config.baseline_min_samples,
            ),
            z_threshold: config.z_score_threshold,
        }
    }

    /// Fraction of track pairs whose range is shrinking.
    fn converging_fraction(tracks: &[Track]) -> f64 {
        if tracks.len() < 2 {
            return 0.0;
        }
        let mut pairs = 0usize;
        let mut closing = 0usize;
        for i in 0..tracks.len() {
            for j in (i + 1)..tracks.len() {
                pairs += 1;
                let a = &tracks[i];
                let b = &tracks[j];
                let dx = b.position.x - a.position.x;
                let dy = b.position.y - a.position.y;
                let dz = b.position.z - a.position.z;
                let dvx = b.velocity.vx - a.velocity.vx;
                let dvy = b.velocity.vy - a.velocity.vy;
                let dvz = b.velocity.vz - a.velocity.vz;
                // Negative range rate means the pair is closing.
                if dx * dvx + dy * dvy + dz * dvz < 0.0 {
                    closing += 1;
                }
            }
        }
        closing as f64 / pairs as f64
    }
}

impl MetricDomain for AirspaceDomain {
    type Input = Vec<Track>;

    fn name(&self) -> &'static str {
        "airspace"
    }

    fn primary_metric(&self, tracks: &Vec<Track>) -> Option<f64> {
        Some(tracks.len() as f64)
    }

    fn deviation_weight(&self) -> f64 {
        0.4
    }

    fn drift_weight(&self) -> f64 {
        0.3
    }

    fn indicators(&mut self, tracks: &Vec<Track>) -> Vec<Trigger> {
        let mut triggers = Vec::new();

        if !tracks.is_empty() {
            let mean_speed =
                tracks.iter().map(Track::speed).sum::<f64>() / tracks.len() as f64;
            if let Some(stats) = self.speed_baseline.stats() {
                if let Some(z) = z_score(mean_speed, &stats) {
                    if z.abs() > self.z_threshold {
                        triggers.push(Trigger {
                            label: "speed_anomaly",
                            weight: 0.3,
                            detail: format!(
                                "mean speed {mean_speed:.0} m/s, z-score {z:.2}"
                            ),
                        });
                    }
                }
            }
            self.speed_baseline.push(mean_speed);
        }

        let converging = Self::converging_fraction(tracks);
        if converging > Self::CONVERGING_FRACTION {
            triggers.push(Trigger {
                label: "convergence",
                weight: 0.2,
                detail: format!("{:.0}% of track pairs closing", converging * 100.0),
            });
        }

        triggers
    }
}

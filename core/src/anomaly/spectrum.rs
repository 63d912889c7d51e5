use ndarray::Array2;

use crate::config::PipelineConfig;
use crate::stats::{shannon_entropy, BaselineWindow};

use super::detector::{MetricDomain, Trigger};

/// One electromagnetic survey: power readings in dB across frequency bins
/// (columns) and dwell intervals (rows).
#[derive(Debug, Clone)]
pub struct SpectrumFrame {
    pub power_db: Array2<f64>,
    pub noise_floor_db: f64,
}

impl SpectrumFrame {
    pub fn mean_power_db(&self) -> Option<f64> {
        if self.power_db.is_empty() {
            return None;
        }
        Some(self.power_db.sum() / self.power_db.len() as f64)
    }

    pub fn peak_power_db(&self) -> Option<f64> {
        self.power_db.iter().copied().fold(None, |acc, v| {
            Some(acc.map_or(v, |m: f64| m.max(v)))
        })
    }

    /// Spectral entropy over per-bin mean power, re-zeroed to the noise
    /// floor so the weights are non-negative.
    pub fn spectral_entropy(&self) -> f64 {
        if self.power_db.is_empty() {
            return 0.0;
        }
        let bins = self.power_db.ncols();
        let rows = self.power_db.nrows() as f64;
        let weights: Vec<f64> = (0..bins)
            .map(|c| {
                let mean = self.power_db.column(c).sum() / rows;
                (mean - self.noise_floor_db).max(0.0)
            })
            .collect();
        shannon_entropy(&weights)
    }
}

/// Electromagnetic spectrum domain: the primary metric is mean received
/// power; indicators watch spectral structure and unexpected strong emitters.
pub struct SpectrumDomain {
    entropy_spike_threshold: f64,
    noise_floor_elevation_db: f64,
    previous_entropy: Option<f64>,
    snr_baseline: BaselineWindow,
}

impl SpectrumDomain {
    /// Peak SNR beyond this multiple of its baseline mean reads as an
    /// unknown emitter.
    const SNR_SURGE_FACTOR: f64 = 1.5;

    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            entropy_spike_threshold: config.entropy_spike_threshold,
            noise_floor_elevation_db: config.noise_floor_elevation_db,
            previous_entropy: None,
            snr_baseline: BaselineWindow::new(
                config.baseline_window,
                config.baseline_min_samples,
            ),
        }
    }
}

impl MetricDomain for SpectrumDomain {
    type Input = SpectrumFrame;

    fn name(&self) -> &'static str {
        "spectrum"
    }

    fn primary_metric(&self, frame: &SpectrumFrame) -> Option<f64> {
        frame.mean_power_db()
    }

    fn deviation_weight(&self) -> f64 {
        0.4
    }

    fn drift_weight(&self) -> f64 {
        0.3
    }

    fn indicators(&mut self, frame: &SpectrumFrame) -> Vec<Trigger> {
        let mut triggers = Vec::new();

        let entropy = frame.spectral_entropy();
        if let Some(previous) = self.previous_entropy {
            let delta = (entropy - previous).abs();
            if delta > self.entropy_spike_threshold {
                triggers.push(Trigger {
                    label: "entropy_shift",
                    weight: 0.2,
                    detail: format!(
                        "spectral entropy moved {delta:.2} (from {previous:.2} to {entropy:.2})"
                    ),
                });
            }
        }
        self.previous_entropy = Some(entropy);

        if let (Some(mean), Some(peak)) = (frame.mean_power_db(), frame.peak_power_db()) {
            if mean > frame.noise_floor_db + self.noise_floor_elevation_db {
                triggers.push(Trigger {
                    label: "noise_floor_elevation",
                    weight: 0.1,
                    detail: format!(
                        "mean power {mean:.1} dB over noise floor {:.1} dB",
                        frame.noise_floor_db
                    ),
                });
            }

            let snr = peak - frame.noise_floor_db;
            if let Some(stats) = self.snr_baseline.stats() {
                if stats.mean > 0.0 && snr > Self::SNR_SURGE_FACTOR * stats.mean {
                    triggers.push(Trigger {
                        label: "unknown_emission",
                        weight: 0.1,
                        detail: format!(
                            "peak SNR {snr:.1} dB against baseline mean {:.1} dB",
                            stats.mean
                        ),
                    });
                }
            }
            self.snr_baseline.push(snr);
        }

        triggers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anomaly::AnomalyDetector;

    fn flat_frame(bins: usize, level_db: f64) -> SpectrumFrame {
        SpectrumFrame {
            power_db: Array2::from_elem((4, bins), level_db),
            noise_floor_db: -90.0,
        }
    }

    #[test]
    fn mean_and_peak_over_the_matrix() {
        let mut frame = flat_frame(8, -80.0);
        frame.power_db[[0, 3]] = -40.0;
        assert!(frame.mean_power_db().unwrap() > -80.0);
        assert_eq!(frame.peak_power_db().unwrap(), -40.0);
    }

    #[test]
    fn empty_frame_has_no_metric() {
        let frame = SpectrumFrame {
            power_db: Array2::zeros((0, 0)),
            noise_floor_db: -90.0,
        };
        assert!(frame.mean_power_db().is_none());
    }

    #[test]
    fn flat_spectrum_has_maximal_entropy() {
        let frame = flat_frame(8, -70.0);
        assert!((frame.spectral_entropy() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_tone_has_low_entropy() {
        let mut frame = flat_frame(8, -90.0);
        for row in 0..4 {
            frame.power_db[[row, 2]] = -40.0;
        }
        assert!(frame.spectral_entropy() < 0.1);
    }

    #[test]
    fn entropy_collapse_fires_the_shift_trigger() {
        let config = PipelineConfig::default();
        let mut domain = SpectrumDomain::new(&config);
        domain.indicators(&flat_frame(8, -70.0));
        let mut tone = flat_frame(8, -90.0);
        for row in 0..4 {
            tone.power_db[[row, 2]] = -40.0;
        }
        let triggers = domain.indicators(&tone);
        assert!(triggers.iter().any(|t| t.label == "entropy_shift"));
    }

    #[test]
    fn broadband_power_rise_is_anomalous() {
        let config = PipelineConfig::default();
        let mut det = AnomalyDetector::new(SpectrumDomain::new(&config), &config);
        for i in 0..12 {
            let level = -80.0 + 0.2 * (i % 3) as f64;
            det.observe(&flat_frame(8, level), i as f64);
        }
        let report = det.observe(&flat_frame(8, -50.0), 12.0);
        assert!(report.anomalous);
        assert!(report
            .triggers
            .iter()
            .any(|t| t.label == "deviation" || t.label == "noise_floor_elevation"));
    }
}

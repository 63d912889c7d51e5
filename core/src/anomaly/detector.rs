use serde::Serialize;

use crate::config::PipelineConfig;
use crate::stats::{z_score, BaselineWindow, Cusum, Ewma};

/// One fired anomaly indicator and its contribution to the score.
#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    pub label: &'static str,
    pub weight: f64,
    pub detail: String,
}

/// Outcome of observing one sample in a domain.
#[derive(Debug, Clone, Serialize)]
pub struct AnomalyReport {
    pub domain: &'static str,
    pub timestamp: f64,
    pub anomalous: bool,
    /// Sum of fired trigger weights, clamped to [0, 1].
    pub score: f64,
    /// Z-score of the primary metric; `None` while the baseline is absent
    /// or has zero spread.
    pub deviation_sigma: Option<f64>,
    pub confidence: f64,
    pub uncertainty: f64,
    pub triggers: Vec<Trigger>,
    /// Human-readable audit trail with the numbers behind each finding.
    pub reasoning: Vec<String>,
}

impl AnomalyReport {
    fn quiet(domain: &'static str, timestamp: f64, reason: String) -> Self {
        Self {
            domain,
            timestamp,
            anomalous: false,
            score: 0.0,
            deviation_sigma: None,
            confidence: 0.5,
            uncertainty: 0.5,
            triggers: Vec::new(),
            reasoning: vec![reason],
        }
    }
}

/// What a monitored domain exposes to the generic detector.
pub trait MetricDomain {
    type Input;

    fn name(&self) -> &'static str;

    /// Scalar the shared baseline tracks for this domain. `None` means the
    /// sample carries no usable primary measurement this cycle.
    fn primary_metric(&self, input: &Self::Input) -> Option<f64>;

    /// Weight contributed by a Z-score deviation of the primary metric.
    fn deviation_weight(&self) -> f64;

    /// Weight contributed by a sustained CUSUM drift of the primary metric.
    fn drift_weight(&self) -> f64;

    /// Domain-specific indicators evaluated in addition to the shared
    /// statistics. Implementations may keep internal state across calls.
    fn indicators(&mut self, input: &Self::Input) -> Vec<Trigger>;
}

/// Generic anomaly detector: shared statistical core plus one plugged-in
/// domain.
pub struct AnomalyDetector<D: MetricDomain> {
    domain: D,
    baseline: BaselineWindow,
    ewma: Ewma,
    cusum: Cusum,
    z_threshold: f64,
    cusum_threshold: f64,
}

impl<D: MetricDomain> AnomalyDetector<D> {
    pub fn new(domain: D, config: &PipelineConfig) -> Self {
        Self {
            domain,
            baseline: BaselineWindow::new(config.baseline_window, config.baseline_min_samples),
            ewma: Ewma::new(config.ewma_alpha),
            cusum: Cusum::new(config.cusum_drift),
            z_threshold: config.z_score_threshold,
            cusum_threshold: config.cusum_threshold,
        }
    }

    pub fn domain_name(&self) -> &'static str {
        self.domain.name()
    }

    /// Scores one sample against the learned baseline.
    ///
    /// The sample is folded into the baseline only after scoring, so a spike
    /// cannot dilute the statistics it is judged against. While the baseline
    /// is still warming up the detector reports normal with mid confidence
    /// rather than guessing.
    pub fn observe(&mut self, input: &D::Input, now: f64) -> AnomalyReport {
        let name = self.domain.name();
        let Some(value) = self.domain.primary_metric(input) else {
            return AnomalyReport::quiet(name, now, "no primary measurement this cycle".into());
        };

        let Some(stats) = self.baseline.stats() else {
            self.baseline.push(value);
            self.ewma.update(value);
            return AnomalyReport::quiet(
                name,
                now,
                format!(
                    "baseline warming up ({}/{} samples)",
                    self.baseline.len(),
                    self.baseline.min_samples()
                ),
            );
        };

        let mut triggers = Vec::new();
        let mut reasoning = Vec::new();
        reasoning.push(format!(
            "primary metric {value:.3} against baseline mean {:.3} (std {:.3}, n={})",
            stats.mean, stats.std, stats.sample_count
        ));

        let deviation_sigma = z_score(value, &stats);
        if let Some(z) = deviation_sigma {
            if z.abs() > self.z_threshold {
                reasoning.push(format!(
                    "z-score {z:.2} exceeds threshold {:.2}",
                    self.z_threshold
                ));
                triggers.push(Trigger {
                    label: "deviation",
                    weight: self.domain.deviation_weight(),
                    detail: format!("z-score {z:.2}"),
                });
            }
        } else {
            reasoning.push("baseline spread is zero, deviation check skipped".into());
        }

        // CUSUM runs over the smoothed series so single-sample noise cannot
        // masquerade as drift.
        let smoothed = self.ewma.update(value);
        let drift = self.cusum.update(smoothed, stats.mean);
        if drift > self.cusum_threshold {
            reasoning.push(format!(
                "cusum statistic {drift:.2} exceeds threshold {:.2}",
                self.cusum_threshold
            ));
            triggers.push(Trigger {
                label: "drift",
                weight: self.domain.drift_weight(),
                detail: format!("cusum {drift:.2}"),
            });
        }

        for trigger in self.domain.indicators(input) {
            reasoning.push(format!("{}: {}", trigger.label, trigger.detail));
            triggers.push(trigger);
        }

        let score: f64 = triggers.iter().map(|t| t.weight).sum::<f64>().clamp(0.0, 1.0);
        let anomalous = score > 0.5 || !triggers.is_empty();
        // Confidence grows with baseline depth.
        let fill = stats.sample_count as f64 / self.baseline.capacity() as f64;
        let confidence = (0.5 + 0.5 * fill).clamp(0.0, 1.0);

        self.baseline.push(value);

        AnomalyReport {
            domain: name,
            timestamp: now,
            anomalous,
            score,
            deviation_sigma,
            confidence,
            uncertainty: 1.0 - confidence,
            triggers,
            reasoning,
        }
    }
}

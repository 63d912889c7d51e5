use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;
use crate::stats::BaselineWindow;

use super::detector::{MetricDomain, Trigger};

/// One audited access attempt against a monitored subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessEvent {
    pub timestamp: f64,
    pub subsystem: String,
    pub resource: String,
    pub granted: bool,
}

/// Access-pattern domain: the primary metric is the per-cycle event count;
/// indicators watch per-subsystem rate surges and irregular sequences.
pub struct AccessDomain {
    rate_limit_multiplier: f64,
    per_subsystem: HashMap<String, BaselineWindow>,
    window: usize,
    min_samples: usize,
}

impl AccessDomain {
    /// Consecutive denials on one subsystem that count as probing.
    const DENIAL_RUN: usize = 3;

    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            rate_limit_multiplier: config.rate_limit_multiplier,
            per_subsystem: HashMap::new(),
            window: config.baseline_window,
            min_samples: config.baseline_min_samples,
        }
    }
}

impl MetricDomain for AccessDomain {
    type Input = Vec<AccessEvent>;

    fn name(&self) -> &'static str {
        "access"
    }

    fn primary_metric(&self, events: &Vec<AccessEvent>) -> Option<f64> {
        // A silent cycle is normal, not a downward deviation.
        if events.is_empty() {
            return None;
        }
        Some(events.len() as f64)
    }

    fn deviation_weight(&self) -> f64 {
        0.4
    }

    fn drift_weight(&self) -> f64 {
        0.3
    }

    fn indicators(&mut self, events: &Vec<AccessEvent>) -> Vec<Trigger> {
        let mut triggers = Vec::new();

        // Per-subsystem rate surge against that subsystem's own baseline.
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for event in events {
            *counts.entry(event.subsystem.as_str()).or_default() += 1;
        }
        for (subsystem, count) in &counts {
            let baseline = self
                .per_subsystem
                .entry((*subsystem).to_owned())
                .or_insert_with(|| BaselineWindow::new(self.window, self.min_samples));
            if let Some(stats) = baseline.stats() {
                if stats.mean > 0.0 && *count as f64 > self.rate_limit_multiplier * stats.mean {
                    triggers.push(Trigger {
                        label: "rate_surge",
                        weight: 0.3,
                        detail: format!(
                            "{count} events on {subsystem}, baseline mean {:.1}",
                            stats.mean
                        ),
                    });
                }
            }
            baseline.push(*count as f64);
        }

        // Sequence irregularities: out-of-order timestamps or denial runs.
        let mut out_of_order = false;
        for pair in events.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                out_of_order = true;
                break;
            }
        }
        let mut denial_run = 0usize;
        let mut worst_run = 0usize;
        for event in events {
            if event.granted {
                denial_run = 0;
            } else {
                denial_run += 1;
                worst_run = worst_run.max(denial_run);
            }
        }
        if out_of_order || worst_run >= Self::DENIAL_RUN {
            let detail = if out_of_order {
                "timestamps out of order".to_owned()
            } else {
                format!("{worst_run} consecutive denials")
            };
            triggers.push(Trigger {
                label: "sequence_irregularity",
                weight: 0.2,
                detail,
            });
        }

        triggers
    }
}

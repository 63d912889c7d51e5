use super::baseline::BaselineStats;

/// Standard score of `value` against a baseline.
///
/// Returns `None` when the baseline has zero spread; a flat history makes
/// deviation-in-sigmas meaningless and callers fall back to other signals.
pub fn z_score(value: f64, stats: &BaselineStats) -> Option<f64> {
    if stats.std <= f64::EPSILON {
        return None;
    }
    Some((value - stats.mean) / stats.std)
}

/// Two-sided CUSUM accumulator for detecting sustained drift away from the
/// baseline mean.
#[derive(Debug, Clone)]
pub struct Cusum {
    pos: f64,
    neg: f64,
    drift: f64,
}

impl Cusum {
    pub fn new(drift: f64) -> Self {
        Self { pos: 0.0, neg: 0.0, drift }
    }

    /// Feeds one observation; returns the larger accumulated excursion.
    pub fn update(&mut self, value: f64, mean: f64) -> f64 {
        let deviation = value - mean;
        self.pos = (self.pos + deviation - self.drift).max(0.0);
        self.neg = (self.neg - deviation - self.drift).max(0.0);
        self.statistic()
    }

    pub fn statistic(&self) -> f64 {
        self.pos.max(self.neg)
    }

    pub fn reset(&mut self) {
        self.pos = 0.0;
        self.neg = 0.0;
    }
}

/// Exponentially weighted moving average smoother.
#[derive(Debug, Clone)]
pub struct Ewma {
    alpha: f64,
    state: Option<f64>,
}

impl Ewma {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, state: None }
    }

    pub fn update(&mut self, value: f64) -> f64 {
        let next = match self.state {
            Some(prev) => self.alpha * value + (1.0 - self.alpha) * prev,
            None => value,
        };
        self.state = Some(next);
        next
    }

    pub fn value(&self) -> Option<f64> {
        self.state
    }
}

/// Shannon entropy of a weight vector, normalized to [0, 1] by log2(n).
///
/// Uniform weights give 1.0; all mass on one bin gives 0.0. Non-positive
/// weights are skipped.
pub fn shannon_entropy(weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 || weights.len() < 2 {
        return 0.0;
    }
    let mut entropy = 0.0;
    for &w in weights {
        if w > 0.0 {
            let p = w / total;
            entropy -= p * p.log2();
        }
    }
    entropy / (weights.len() as f64).log2()
}

use std::collections::VecDeque;

/// Mean and sample standard deviation over the current window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineStats {
    pub mean: f64,
    pub std: f64,
    pub sample_count: usize,
}

/// Sliding window of recent observations that serves as the "normal"
/// reference for deviation scoring.
///
/// The window refuses to report statistics until it holds `min_samples`
/// observations; callers treat that as insufficient data, not as zero.
#[derive(Debug, Clone)]
pub struct BaselineWindow {
    samples: VecDeque<f64>,
    capacity: usize,
    min_samples: usize,
}

impl BaselineWindow {
    pub fn new(capacity: usize, min_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            min_samples,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_established(&self) -> bool {
        self.samples.len() >= self.min_samples
    }

    /// Statistics over the window, or `None` while still warming up.
    pub fn stats(&self) -> Option<BaselineStats> {
        if !self.is_established() {
            return None;
        }
        let n = self.samples.len() as f64;
        let mean = self.samples.iter().sum::<f64>() / n;
        let var = self
            .samples
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / (n - 1.0);
        Some(BaselineStats {
            mean,
            std: var.sqrt(),
            sample_count: self.samples.len(),
        })
    }
}

use std::sync::Mutex;

use serde::Serialize;

/// Point-in-time copy of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MetricsSnapshot {
    pub cycles: usize,
    pub detections_accepted: usize,
    pub detections_rejected: usize,
    pub recommendations_issued: usize,
    pub errors: usize,
}

/// Interior-mutable counters shared across pipeline callers.
///
/// A poisoned lock degrades to a no-op rather than taking the pipeline
/// down with it.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_cycle(&self, accepted: usize, rejected: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cycles += 1;
            metrics.detections_accepted += accepted;
            metrics.detections_rejected += rejected;
        }
    }

    pub fn record_recommendations(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.recommendations_issued += count;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_across_cycles() {
        let recorder = MetricsRecorder::new();
        recorder.record_cycle(5, 2);
        recorder.record_cycle(3, 0);
        recorder.record_recommendations(1);
        recorder.record_error();

        let snap = recorder.snapshot();
        assert_eq!(snap.cycles, 2);
        assert_eq!(snap.detections_accepted, 8);
        assert_eq!(snap.detections_rejected, 2);
        assert_eq!(snap.recommendations_issued, 1);
        assert_eq!(snap.errors, 1);
    }
}

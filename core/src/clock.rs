//! Time source abstraction.
//!
//! Components never call `SystemTime::now` directly; they take a clock so the
//! decay, staleness and baseline logic can be exercised deterministically.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Epoch-seconds time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}

/// Manually advanced clock for tests and offline replay.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<f64>,
}

impl FixedClock {
    pub fn new(now: f64) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: f64) {
        *self.lock() = now;
    }

    pub fn advance(&self, secs: f64) {
        *self.lock() += secs;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, f64> {
        self.now
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(100.0);
        assert_eq!(clock.now(), 100.0);
        clock.advance(2.5);
        assert_eq!(clock.now(), 102.5);
        clock.set(50.0);
        assert_eq!(clock.now(), 50.0);
    }

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}

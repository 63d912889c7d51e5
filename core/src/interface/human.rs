use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::decision::Recommendation;

/// Channel to the human operator.
///
/// `await_approval` is a bounded wait: `None` on timeout means no verdict
/// arrived and callers must treat the recommendation as unapproved.
pub trait HumanInterface: Send + Sync {
    /// Puts a recommendation in front of the operator; `false` means the
    /// console could not display it.
    fn present(&self, recommendation: &Recommendation) -> bool;

    /// Blocks up to `timeout_secs` for a verdict on the given track's
    /// recommendation.
    fn await_approval(&self, track_id: &str, timeout_secs: f64) -> Option<bool>;

    /// Records a verdict, delivered asynchronously from the console.
    fn submit_verdict(&self, track_id: &str, approved: bool);
}

/// Verdict table shared between the pipeline and the console side.
#[derive(Debug, Default)]
pub struct PendingApprovals {
    verdicts: Mutex<HashMap<String, bool>>,
}

impl PendingApprovals {
    pub fn open(&self, track_id: &str) {
        if let Ok(mut verdicts) = self.verdicts.lock() {
            verdicts.remove(track_id);
        }
    }

    pub fn submit(&self, track_id: &str, approved: bool) {
        if let Ok(mut verdicts) = self.verdicts.lock() {
            verdicts.insert(track_id.to_owned(), approved);
        }
    }

    pub fn take(&self, track_id: &str) -> Option<bool> {
        self.verdicts
            .lock()
            .ok()
            .and_then(|mut verdicts| verdicts.remove(track_id))
    }
}

/// Console-backed operator interface: recommendations go to the log, and
/// verdicts arrive through [`PendingApprovals`].
#[derive(Debug, Default)]
pub struct ConsoleInterface {
    approvals: PendingApprovals,
}

impl ConsoleInterface {
    const POLL_INTERVAL: Duration = Duration::from_millis(100);
}

impl HumanInterface for ConsoleInterface {
    fn present(&self, recommendation: &Recommendation) -> bool {
        self.approvals.open(&recommendation.track_id);
        info!(
            "[REVIEW] {} {}: {}",
            recommendation.threat_level.as_str(),
            recommendation.track_id,
            recommendation.summary
        );
        true
    }

    fn await_approval(&self, track_id: &str, timeout_secs: f64) -> Option<bool> {
        let deadline = Instant::now() + Duration::from_secs_f64(timeout_secs.max(0.0));
        loop {
            if let Some(verdict) = self.approvals.take(track_id) {
                return Some(verdict);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("no verdict on {track_id} within {timeout_secs:.0}s");
                return None;
            }
            thread::sleep(Self::POLL_INTERVAL.min(remaining));
        }
    }

    fn submit_verdict(&self, track_id: &str, approved: bool) {
        self.approvals.submit(track_id, approved);
    }
}

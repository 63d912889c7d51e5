use std::sync::Mutex;

use log::info;
use serde::Serialize;
use serde_json::Value;

/// One recorded audit entry.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub kind: String,
    pub payload: Value,
    pub timestamp: f64,
}

/// Destination for the pipeline's audit trail.
///
/// Every cycle outcome, rejection batch and review verdict goes through
/// here; implementations must never fail the caller.
pub trait AuditSink: Send + Sync {
    fn record(&self, kind: &str, payload: Value, timestamp: f64);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _kind: &str, _payload: Value, _timestamp: f64) {}
}

/// Writes each entry to the process log as one JSON line.
#[derive(Debug, Default)]
pub struct LogAudit;

impl AuditSink for LogAudit {
    fn record(&self, kind: &str, payload: Value, timestamp: f64) {
        info!(target: "audit", "{timestamp:.3} {kind} {payload}");
    }
}

/// Buffers entries in memory; used by tests and the offline simulator.
#[derive(Debug, Default)]
pub struct MemoryAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAudit {
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn events_of_kind(&self, kind: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .collect()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, kind: &str, payload: Value, timestamp: f64) {
        if let Ok(mut events) = self.events.lock() {
            events.push(AuditEvent {
                kind: kind.to_owned(),
                payload,
                timestamp,
            });
        }
    }
}

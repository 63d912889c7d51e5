//! Pipeline orchestration.
//!
//! One `run_cycle` call carries a batch of sensor input through validation,
//! fusion, assessment, anomaly monitoring and decision aggregation, then
//! publishes an immutable state snapshot. Cycles are exclusive; readers are
//! never blocked by a cycle in progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{error, info};
use serde_json::json;

use crate::anomaly::{
    AccessDomain, AccessEvent, AirspaceDomain, AnomalyDetector, AnomalyReport, SpectrumDomain,
    SpectrumFrame,
};
use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;
use crate::contact::Detection;
use crate::decision::{DecisionAggregator, DecisionInputs, DecisionResult};
use crate::fusion::{Track, Tracker};
use crate::interface::{AuditSink, ConsoleInterface, HumanInterface, LogAudit};
use crate::risk::ThreatAssessor;
use crate::telemetry::{MetricsRecorder, MetricsSnapshot};
use crate::validation::ValidationGate;
use crate::{PipelineError, PipelineResult};

/// Everything one cycle consumes.
#[derive(Debug, Default)]
pub struct CycleInput {
    pub detections: Vec<Detection>,
    pub spectrum: Option<SpectrumFrame>,
    pub access_events: Vec<AccessEvent>,
}

/// Immutable view of the pipeline after a completed cycle.
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub timestamp: f64,
    pub tracks: Vec<Track>,
    pub last_decision: Option<DecisionResult>,
}

impl StateSnapshot {
    fn empty(timestamp: f64) -> Self {
        Self {
            timestamp,
            tracks: Vec::new(),
            last_decision: None,
        }
    }
}

/// Mutable pipeline stages, guarded by one exclusive cycle lock.
struct CycleCore {
    tracker: Tracker,
    assessor: ThreatAssessor,
    airspace: AnomalyDetector<AirspaceDomain>,
    spectrum: AnomalyDetector<SpectrumDomain>,
    access: AnomalyDetector<AccessDomain>,
    aggregator: DecisionAggregator,
}

/// The advisory pipeline.
///
/// All outputs are recommendations for a human; there is no path from here
/// to any actuator.
pub struct AdvisoryPipeline {
    gate: ValidationGate,
    core: Mutex<CycleCore>,
    snapshot: Mutex<Arc<StateSnapshot>>,
    audit: Arc<dyn AuditSink>,
    human: Arc<dyn HumanInterface>,
    clock: Arc<dyn Clock>,
    metrics: MetricsRecorder,
    operator_present: AtomicBool,
}

impl AdvisoryPipeline {
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        config.validate()?;
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let now = clock.now();
        Ok(Self {
            gate: ValidationGate::new(&config),
            core: Mutex::new(CycleCore {
                tracker: Tracker::new(&config),
                assessor: ThreatAssessor::new(&config),
                airspace: AnomalyDetector::new(AirspaceDomain::new(&config), &config),
                spectrum: AnomalyDetector::new(SpectrumDomain::new(&config), &config),
                access: AnomalyDetector::new(AccessDomain::new(&config), &config),
                aggregator: DecisionAggregator::new(&config),
            }),
            snapshot: Mutex::new(Arc::new(StateSnapshot::empty(now))),
            audit: Arc::new(LogAudit),
            human: Arc::new(ConsoleInterface::default()),
            clock,
            metrics: MetricsRecorder::new(),
            operator_present: AtomicBool::new(false),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_interface(mut self, human: Arc<dyn HumanInterface>) -> Self {
        self.human = human;
        self
    }

    pub fn set_operator_present(&self, present: bool) {
        self.operator_present.store(present, Ordering::SeqCst);
        info!(
            "operator {}",
            if present { "on console" } else { "absent" }
        );
    }

    pub fn operator_present(&self) -> bool {
        self.operator_present.load(Ordering::SeqCst)
    }

    /// Runs one full advisory cycle.
    ///
    /// The published snapshot changes exactly once, at the end of a
    /// successful cycle; a failed cycle leaves the previous snapshot in
    /// place.
    pub fn run_cycle(&self, input: CycleInput) -> PipelineResult<DecisionResult> {
        let now = self.clock.now();

        let outcome = self.gate.check_batch(&input.detections, now);
        if !outcome.rejected.is_empty() {
            self.audit.record(
                "rejection",
                json!({
                    "count": outcome.rejected.len(),
                    "reasons": outcome
                        .rejected
                        .iter()
                        .map(|r| r.reasons.join("; "))
                        .collect::<Vec<_>>(),
                }),
                now,
            );
        }
        self.metrics
            .record_cycle(outcome.accepted.len(), outcome.rejected.len());

        let mut core = self.core.lock().map_err(|_| {
            self.metrics.record_error();
            error!("cycle state poisoned by a previous panic");
            PipelineError::Internal("cycle state poisoned".into())
        })?;

        core.tracker.ingest(&outcome.accepted, now);
        core.tracker.maintain(now);
        let all_tracks = core.tracker.snapshot(now);
        let established = core.tracker.established(now);

        let assessments = core.assessor.assess_all(&established, now);

        let mut reports: Vec<AnomalyReport> = Vec::with_capacity(3);
        reports.push(core.airspace.observe(&established, now));
        if let Some(frame) = &input.spectrum {
            reports.push(core.spectrum.observe(frame, now));
        }
        reports.push(core.access.observe(&input.access_events, now));

        let decision = core.aggregator.decide(DecisionInputs {
            operator_present: self.operator_present(),
            tracks: &established,
            assessments: &assessments,
            anomalies: &reports,
            now,
        });
        drop(core);

        for recommendation in &decision.recommendations {
            if !self.human.present(recommendation) {
                error!("console refused recommendation for {}", recommendation.track_id);
                self.metrics.record_error();
            }
        }
        self.metrics
            .record_recommendations(decision.recommendations.len());

        self.audit.record(
            "cycle",
            json!({
                "mode": decision.state.mode.as_str(),
                "fail_safe": decision.state.fail_safe,
                "tracks": all_tracks.len(),
                "assessed": assessments.len(),
                "accepted": outcome.accepted.len(),
                "rejected": outcome.rejected.len(),
                "violations": decision.state.airspace_violations,
                "anomalies": decision.state.anomalies,
            }),
            now,
        );

        let next = Arc::new(StateSnapshot {
            timestamp: now,
            tracks: all_tracks,
            last_decision: Some(decision.clone()),
        });
        // Lock held only for the pointer swap; readers holding the old Arc
        // keep a consistent pre-cycle view.
        *self.snapshot.lock().map_err(|_| {
            PipelineError::Internal("snapshot state poisoned".into())
        })? = next;

        Ok(decision)
    }

    /// Latest committed snapshot. Never blocks on a running cycle.
    pub fn current_state(&self) -> Arc<StateSnapshot> {
        self.snapshot
            .lock()
            .map(|guard| Arc::clone(&guard))
            .unwrap_or_else(|poisoned| Arc::clone(&poisoned.into_inner()))
    }

    pub fn current_tracks(&self) -> Vec<Track> {
        self.current_state().tracks.clone()
    }

    /// Forwards an operator verdict and records it in the audit trail.
    pub fn submit_verdict(&self, track_id: &str, approved: bool) {
        self.human.submit_verdict(track_id, approved);
        self.audit.record(
            "review",
            json!({ "track_id": track_id, "approved": approved }),
            self.clock.now(),
        );
    }

    /// Bounded wait for an operator verdict on a presented recommendation.
    pub fn await_approval(&self, track_id: &str, timeout_secs: f64) -> Option<bool> {
        self.human.await_approval(track_id, timeout_secs)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

use std::sync::Arc;

use anyhow::Context;
use skywatchcore::clock::{Clock, SystemClock};
use skywatchcore::decision::SystemMode;
use skywatchcore::telemetry::MetricsSnapshot;
use skywatchcore::{AdvisoryPipeline, PipelineConfig};

use crate::scenario::generator::SimulationContext;

/// Drives the pipeline with generated input and renders one summary line
/// per cycle.
pub struct CycleRunner {
    pipeline: AdvisoryPipeline,
    clock: Arc<dyn Clock>,
}

impl CycleRunner {
    pub fn new(config: PipelineConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: PipelineConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let pipeline = AdvisoryPipeline::new(config)
            .context("configuring pipeline")?
            .with_clock(Arc::clone(&clock));
        Ok(Self { pipeline, clock })
    }

    pub fn set_operator_present(&self, present: bool) {
        self.pipeline.set_operator_present(present);
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.pipeline.metrics()
    }

    /// Runs one cycle and returns a console summary.
    pub fn step(&self, context: &mut SimulationContext) -> anyhow::Result<String> {
        let now = self.clock.now();
        let input = context.next_cycle(now);
        let fed = input.detections.len();
        let decision = self
            .pipeline
            .run_cycle(input)
            .context("running advisory cycle")?;

        let mut line = format!(
            "t={now:.0} mode={} tracks={} fed={} unc={:.2}",
            decision.state.mode.as_str(),
            self.pipeline.current_tracks().len(),
            fed,
            decision.state.aggregate_uncertainty,
        );
        if decision.state.fail_safe {
            line.push_str(" FAIL-SAFE");
        }
        for violation in &decision.state.airspace_violations {
            line.push_str(&format!(" [{violation}]"));
        }
        for anomaly in &decision.state.anomalies {
            line.push_str(&format!(" [{anomaly}]"));
        }
        if decision.state.mode == SystemMode::HumanApprovalRequired {
            for rec in &decision.recommendations {
                line.push_str(&format!("\n  REVIEW {}", rec.summary));
            }
        }
        Ok(line)
    }
}

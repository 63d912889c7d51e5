use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use skywatchcore::clock::{Clock, FixedClock};
use skywatchcore::PipelineConfig;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

use runner::CycleRunner;
use scenario::config::ScenarioConfig;
use scenario::generator::SimulationContext;

mod runner;
mod scenario;

#[derive(Parser)]
#[command(author, version, about = "Synthetic scenario driver for the Skywatch advisory pipeline")]
struct Args {
    /// Run a fixed number of cycles on a simulated clock and exit
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a scenario from YAML
    #[arg(long)]
    scenario: Option<PathBuf>,
    /// Cycles to run in offline mode
    #[arg(long, default_value_t = 60)]
    cycles: u32,
    /// Cycle period in seconds for live mode
    #[arg(long, default_value_t = 1.0)]
    rate: f64,
    /// Start with no operator on console
    #[arg(long, default_value_t = false)]
    unattended: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scenario_config = if let Some(path) = args.scenario {
        ScenarioConfig::load(path)?
    } else {
        ScenarioConfig::default()
    };
    log::info!("scenario {} (seed {})", scenario_config.name, scenario_config.seed);

    let mut context = SimulationContext::new(scenario_config);

    if args.offline {
        let clock = Arc::new(FixedClock::new(1_000.0));
        let runner =
            CycleRunner::with_clock(PipelineConfig::default(), Arc::clone(&clock) as Arc<dyn Clock>)
                .context("building pipeline")?;
        runner.set_operator_present(!args.unattended);

        for _ in 0..args.cycles {
            let summary = runner.step(&mut context)?;
            println!("{summary}");
            clock.advance(context.cycle_secs());
        }
        let metrics = runner.metrics();
        println!(
            "Offline run -> cycles {}, accepted {}, rejected {}, recommendations {}",
            metrics.cycles,
            metrics.detections_accepted,
            metrics.detections_rejected,
            metrics.recommendations_issued
        );
        return Ok(());
    }

    let runner = CycleRunner::new(PipelineConfig::default()).context("building pipeline")?;
    runner.set_operator_present(!args.unattended);
    let period = Duration::from_secs_f64(args.rate.max(0.05));

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime")?;
    runtime.block_on(async {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = runner.step(&mut context)?;
                    println!("{summary}");
                }
                _ = signal::ctrl_c() => {
                    println!("shutting down");
                    break;
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

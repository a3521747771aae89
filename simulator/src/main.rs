use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::{default_bind_address, GuiBridge};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use workflow::config::{DriverConfig, SourceConfig};
use workflow::runner::{RunOptions, Runner};

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "LDR sensor telemetry driver")]
struct Args {
    /// Load a driver config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Replay a captured serial log instead of the synthetic sensor
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Synthetic readings per second
    #[arg(long)]
    rate: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Stop after this many seconds
    #[arg(long)]
    duration: Option<f64>,
    /// Write every snapshot as a JSON line
    #[arg(long)]
    json_out: Option<PathBuf>,
    /// Serve the latest snapshot over HTTP
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long, default_value_t = default_bind_address())]
    bind: SocketAddr,
}

impl Args {
    fn driver_config(&self) -> anyhow::Result<DriverConfig> {
        let mut config = match &self.config {
            Some(path) => DriverConfig::load(path)?,
            None => DriverConfig::default(),
        };
        if let Some(path) = &self.replay {
            config.source = SourceConfig::Replay { path: path.clone() };
        }
        if let Some(rate) = self.rate {
            config.generator.rate_hz = rate;
        }
        if let Some(seed) = self.seed {
            config.generator.seed = seed;
        }
        Ok(config)
    }

    fn run_options(&self) -> anyhow::Result<RunOptions> {
        let duration = self
            .duration
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("--duration must be a non-negative number of seconds")?;
        Ok(RunOptions {
            duration,
            json_output: self.json_out.clone(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = args.driver_config()?;
    let options = args.run_options()?;
    let runner = Runner::new(config);

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating tokio runtime")?;

    let summary = runtime.block_on(async {
        let bridge = if args.serve {
            let bridge = GuiBridge::new();
            bridge.serve(args.bind)?;
            Some(bridge)
        } else {
            None
        };
        runner.run(&options, bridge.as_ref()).await
    })?;

    info!(
        "finished: {:?} after {} snapshots",
        summary.last.termination, summary.snapshots
    );
    let counters = summary.counters;
    println!(
        "Run -> decoded {}, decode errors {}, overflows {}, out of range {}, reordered {}, ticks {}",
        counters.lines_decoded,
        counters.decode_errors,
        counters.queue_overflows,
        counters.out_of_range,
        counters.reordered,
        counters.ticks
    );

    Ok(())
}

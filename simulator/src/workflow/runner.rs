use crate::generator::profile::SyntheticSource;
use crate::gui_bridge::bridge::GuiBridge;
use crate::gui_bridge::model::BridgeModel;
use crate::workflow::config::{DriverConfig, SourceConfig};
use anyhow::Context;
use ldrcore::pipeline::{ByteSource, ReaderSource};
use ldrcore::telemetry::PipelineCounters;
use ldrcore::{Channel, Pipeline, Snapshot};
use log::{debug, info, warn};
use std::fs::File;
use std::future;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, time};

/// Per-run options that do not belong in the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub duration: Option<Duration>,
    /// Append every snapshot as one JSON line.
    pub json_output: Option<PathBuf>,
}

pub struct RunSummary {
    pub snapshots: u64,
    pub last: Arc<Snapshot>,
    pub counters: PipelineCounters,
}

#[derive(Clone)]
pub struct Runner {
    config: DriverConfig,
}

impl Runner {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn build_source(&self) -> anyhow::Result<Box<dyn ByteSource>> {
        match &self.config.source {
            SourceConfig::Synthetic => {
                let source = SyntheticSource::new(self.config.generator.clone())
                    .context("building synthetic sensor")?;
                Ok(Box::new(source))
            }
            SourceConfig::Replay { path } => {
                let file = File::open(path)
                    .with_context(|| format!("opening replay file {}", path.display()))?;
                Ok(Box::new(ReaderSource::new(
                    file,
                    path.display().to_string(),
                )))
            }
        }
    }

    /// Runs the pipeline until the source ends, Ctrl+C, or the duration
    /// elapses, publishing every snapshot to `bridge` when one is given.
    pub async fn run(
        &self,
        options: &RunOptions,
        bridge: Option<&GuiBridge>,
    ) -> anyhow::Result<RunSummary> {
        self.config.validate()?;
        let source = self.build_source()?;
        let pipeline =
            Pipeline::new(self.config.pipeline.clone()).context("building pipeline")?;
        let handle = pipeline.start(source).context("starting pipeline")?;

        let mut writer = match &options.json_output {
            Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
                format!("creating JSON output {}", path.display())
            })?)),
            None => None,
        };

        let mut stream = handle.subscribe();
        let interrupt = signal::ctrl_c();
        tokio::pin!(interrupt);
        let deadline = async {
            match options.duration {
                Some(limit) => time::sleep(limit).await,
                None => future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline);

        let mut snapshots = 0u64;
        loop {
            tokio::select! {
                next = stream.next() => {
                    let Some(snapshot) = next else { break };
                    snapshots += 1;
                    let counters = handle.counters();
                    let model = BridgeModel {
                        snapshot: Some(snapshot.clone()),
                        counters,
                    };
                    info!("[runner] {}", model.status_line());
                    if let Some((low, high)) = model.value_range(Channel::Light) {
                        debug!(
                            "[runner] snapshot {} with {} samples, window {:.1}..{:.1} s, light {:.1}..{:.1}%",
                            snapshot.sequence,
                            snapshot.len(),
                            snapshot.time_window.start,
                            snapshot.time_window.end,
                            low,
                            high
                        );
                    }
                    if let Some(out) = writer.as_mut() {
                        let line = snapshot.to_json().context("serializing snapshot")?;
                        writeln!(out, "{}", line).context("writing JSON output")?;
                    }
                    if let Some(bridge) = bridge {
                        bridge.publish(snapshot, counters);
                    }
                }
                result = &mut interrupt => {
                    if let Err(err) = result {
                        warn!("[runner] Ctrl+C handler failed: {}", err);
                    }
                    info!("[runner] interrupted, stopping");
                    break;
                }
                _ = &mut deadline => {
                    info!("[runner] duration elapsed, stopping");
                    break;
                }
            }
        }

        let metrics = handle.metrics();
        let last = handle.stop().await.context("pipeline ended with an error")?;
        if let Some(mut out) = writer {
            out.flush().context("flushing JSON output")?;
        }
        let counters = metrics.snapshot();
        if let Some(bridge) = bridge {
            bridge.publish(last.clone(), counters);
        }

        Ok(RunSummary {
            snapshots,
            last,
            counters,
        })
    }
}

//! Producer/assembler lifecycle.
//!
//! ```text
//! ByteSource --poll--> Producer --SampleQueue (drop-oldest)--> Assembler --watch--> subscribers
//!                      (blocking pool)                         (interval task)
//! ```
//!
//! The queue is the only channel between the two tasks. Buffers and filter
//! state live inside the assembler task.

pub mod assembler;
pub mod producer;
pub mod queue;
pub mod snapshot;
pub mod source;

pub use assembler::{Assembler, TickOutcome, MIN_SAMPLES};
pub use producer::{LineSplitter, Producer, MAX_LINE_BYTES};
pub use queue::{PushOutcome, QueueDrain, SampleQueue};
pub use snapshot::{ChannelSeries, SmoothedSeries, Snapshot, Termination, TimeWindow};
pub use source::{ByteSource, ReaderSource, SourcePoll};

use crate::prelude::{PipelineConfig, TelemetryError, TelemetryResult};
use crate::telemetry::{LogManager, MetricsRecorder, PipelineCounters};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

/// A validated pipeline that has not started yet.
///
/// All buffers and filter states are created here, once.
pub struct Pipeline {
    config: PipelineConfig,
    assembler: Assembler,
    queue: Arc<SampleQueue>,
    metrics: Arc<MetricsRecorder>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> TelemetryResult<Self> {
        config.validate()?;
        let metrics = Arc::new(MetricsRecorder::new());
        let assembler = Assembler::new(&config, metrics.clone())?;
        let queue = Arc::new(SampleQueue::new(config.queue_capacity)?);
        Ok(Self {
            config,
            assembler,
            queue,
            metrics,
        })
    }

    /// Spawns the producer and the assembler on the current tokio runtime.
    pub fn start<S>(self, source: S) -> TelemetryResult<PipelineHandle>
    where
        S: ByteSource + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|err| TelemetryError::Runtime(format!("no tokio runtime: {}", err)))?;
        let Pipeline {
            config,
            mut assembler,
            queue,
            metrics,
        } = self;
        let logger = LogManager::new("pipeline");

        let cancel = Arc::new(AtomicBool::new(false));
        let initial = assembler.assemble(None);
        let (sender, receiver) = watch::channel(initial);

        let producer = Producer::new(
            source,
            queue.clone(),
            metrics.clone(),
            cancel.clone(),
            config.poll_interval(),
        );
        let producer_queue = queue.clone();
        let producer_metrics = metrics.clone();
        let producer_task = runtime.spawn_blocking(move || {
            panic::catch_unwind(AssertUnwindSafe(|| producer.run())).unwrap_or_else(|payload| {
                let reason = Termination::SourceLost(format!(
                    "producer panicked: {}",
                    panic_message(payload.as_ref())
                ));
                producer_metrics.record_source_failure();
                producer_queue.close(reason.clone());
                reason
            })
        });
        let assembler_task = runtime.spawn(run_assembler(
            assembler,
            queue.clone(),
            sender,
            config.tick_interval(),
        ));

        logger.record(&format!(
            "started: tick {} ms, poll {} ms, buffer {} samples",
            config.tick_interval_ms, config.poll_interval_ms, config.buffer_capacity
        ));

        Ok(PipelineHandle {
            stop_signal: StopSignal(cancel),
            snapshots: receiver,
            metrics,
            queue,
            producer: producer_task,
            assembler: assembler_task,
            logger,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

async fn run_assembler(
    mut assembler: Assembler,
    queue: Arc<SampleQueue>,
    sender: watch::Sender<Arc<Snapshot>>,
    tick: Duration,
) -> Arc<Snapshot> {
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let outcome = assembler.tick(&queue);
        if outcome.changed {
            sender.send_replace(outcome.snapshot.clone());
        }
        if outcome.finished {
            return outcome.snapshot;
        }
    }
}

/// Raises the cancellation flag when dropped, so an abandoned handle still
/// shuts the producer down.
struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl Drop for StopSignal {
    fn drop(&mut self) {
        self.raise();
    }
}

/// Control surface of a running pipeline.
pub struct PipelineHandle {
    stop_signal: StopSignal,
    snapshots: watch::Receiver<Arc<Snapshot>>,
    metrics: Arc<MetricsRecorder>,
    queue: Arc<SampleQueue>,
    producer: JoinHandle<Termination>,
    assembler: JoinHandle<Arc<Snapshot>>,
    logger: LogManager,
}

impl PipelineHandle {
    /// Most recent snapshot; never waits.
    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        let mut receiver = self.snapshots.clone();
        let current = receiver.borrow_and_update().clone();
        SnapshotStream {
            finished: current.is_final(),
            pending: Some(current),
            receiver,
        }
    }

    pub fn counters(&self) -> PipelineCounters {
        self.metrics.snapshot()
    }

    /// Shared counters, still readable once the handle is consumed.
    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.assembler.is_finished()
    }

    /// Cancels the producer, lets the assembler drain what was queued, and
    /// returns the final snapshot.
    pub async fn stop(self) -> TelemetryResult<Arc<Snapshot>> {
        self.logger.record("stop requested");
        self.stop_signal.raise();
        self.join().await
    }

    /// Waits for the stream to end on its own.
    ///
    /// A lost source is reported here as `SourceUnavailable`. The queue is
    /// closed however the producer exits, so the assembler always finishes.
    pub async fn join(self) -> TelemetryResult<Arc<Snapshot>> {
        let PipelineHandle {
            stop_signal,
            queue,
            producer,
            assembler,
            logger,
            ..
        } = self;

        let exit = match producer.await {
            Ok(exit) => exit,
            Err(err) => {
                let reason = Termination::SourceLost(format!("producer task failed: {}", err));
                queue.close(reason.clone());
                reason
            }
        };
        let last = assembler
            .await
            .map_err(|err| TelemetryError::Runtime(format!("assembler task failed: {}", err)))?;
        drop(stop_signal);

        logger.record(&format!(
            "finished after {} snapshots ({:?})",
            last.sequence, exit
        ));
        match exit {
            Termination::SourceLost(message) => Err(TelemetryError::SourceUnavailable(message)),
            Termination::Stopped | Termination::Exhausted => Ok(last),
        }
    }
}

/// Snapshots of one pipeline, oldest first.
///
/// Yields the snapshot current at subscription time, then each newer one.
/// Snapshots published faster than they are consumed are coalesced to the
/// latest. The stream ends after the final snapshot.
pub struct SnapshotStream {
    receiver: watch::Receiver<Arc<Snapshot>>,
    pending: Option<Arc<Snapshot>>,
    finished: bool,
}

impl SnapshotStream {
    pub async fn next(&mut self) -> Option<Arc<Snapshot>> {
        if let Some(snapshot) = self.pending.take() {
            return Some(snapshot);
        }
        if self.finished {
            return None;
        }
        match self.receiver.changed().await {
            Ok(()) => {
                let snapshot = self.receiver.borrow_and_update().clone();
                self.finished = snapshot.is_final();
                Some(snapshot)
            }
            Err(_) => {
                self.finished = true;
                None
            }
        }
    }
}

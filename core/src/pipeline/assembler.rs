use crate::math::{StatsHelper, ValueRange};
use crate::pipeline::queue::SampleQueue;
use crate::pipeline::snapshot::{ChannelSeries, SmoothedSeries, Snapshot, Termination, TimeWindow};
use crate::prelude::{PipelineConfig, TelemetryResult};
use crate::processing::{FilterBank, RingBuffer};
use crate::record::{Channel, LightStatus, Record};
use crate::telemetry::{LogManager, MetricsRecorder};
use std::sync::Arc;

/// Autoscaling needs more than this many buffered samples.
pub const MIN_SAMPLES: usize = 5;

/// Display range of `values`: the min/max padded by `margin_fraction` of the
/// spread and clamped to `bounds`, or `bounds` itself while there are at most
/// [`MIN_SAMPLES`] values.
pub fn autoscale(values: &RingBuffer<f64>, bounds: ValueRange, margin_fraction: f64) -> ValueRange {
    if values.len() <= MIN_SAMPLES {
        return bounds;
    }
    match StatsHelper::min_max(values.iter().copied()) {
        Some((min, max)) => {
            let margin = (max - min) * margin_fraction;
            ValueRange::new(min - margin, max + margin).clamp_within(bounds)
        }
        None => bounds,
    }
}

struct ChannelState {
    channel: Channel,
    raw: RingBuffer<f64>,
    bank: FilterBank,
    smoothed: Vec<RingBuffer<f64>>,
}

impl ChannelState {
    fn new(channel: Channel, config: &PipelineConfig) -> TelemetryResult<Self> {
        let bank = FilterBank::from_config(config)?;
        let smoothed = (0..bank.len())
            .map(|_| RingBuffer::with_capacity(config.buffer_capacity))
            .collect::<TelemetryResult<Vec<_>>>()?;
        Ok(Self {
            channel,
            raw: RingBuffer::with_capacity(config.buffer_capacity)?,
            bank,
            smoothed,
        })
    }

    fn push(&mut self, raw: f64) {
        self.raw.push(raw);
        for (history, (_, value)) in self.smoothed.iter_mut().zip(self.bank.apply(raw)) {
            history.push(value);
        }
    }

    fn series(&self, margin_fraction: f64) -> ChannelSeries {
        ChannelSeries {
            channel: self.channel,
            raw: self.raw.to_vec(),
            smoothed: self
                .bank
                .kinds()
                .zip(&self.smoothed)
                .map(|(kind, history)| SmoothedSeries {
                    kind,
                    values: history.to_vec(),
                })
                .collect(),
            value_range: autoscale(&self.raw, self.channel.bounds(), margin_fraction),
        }
    }
}

/// Result of a single assembler tick.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub snapshot: Arc<Snapshot>,
    pub ingested: usize,
    /// False when the previous snapshot was re-published unchanged.
    pub changed: bool,
    /// True once the queue is closed and drained; no further ticks follow.
    pub finished: bool,
}

/// Owns every buffer and filter state and turns drained records into
/// snapshots.
pub struct Assembler {
    window_seconds: f64,
    lead_seconds: f64,
    margin_fraction: f64,
    timestamps: RingBuffer<f64>,
    channels: Vec<ChannelState>,
    latest: Option<Record>,
    latest_status: Option<LightStatus>,
    sequence: u64,
    last_snapshot: Option<Arc<Snapshot>>,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl Assembler {
    pub fn new(config: &PipelineConfig, metrics: Arc<MetricsRecorder>) -> TelemetryResult<Self> {
        let channels = Channel::ALL
            .iter()
            .map(|channel| ChannelState::new(*channel, config))
            .collect::<TelemetryResult<Vec<_>>>()?;
        Ok(Self {
            window_seconds: config.window_seconds,
            lead_seconds: config.lead_seconds,
            margin_fraction: config.margin_fraction,
            timestamps: RingBuffer::with_capacity(config.buffer_capacity)?,
            channels,
            latest: None,
            latest_status: None,
            sequence: 0,
            last_snapshot: None,
            metrics,
            logger: LogManager::new("assembler"),
        })
    }

    /// Pushes one record into every channel buffer and filter.
    ///
    /// A timestamp older than the last accepted one is raised to it so the
    /// buffered time axis never runs backwards.
    pub fn ingest(&mut self, mut record: Record) {
        if let Some(previous) = self.latest.map(|latest| latest.timestamp) {
            if record.timestamp < previous {
                self.metrics.record_reordered();
                record.timestamp = previous;
            }
        }
        for _ in record.out_of_range_channels() {
            self.metrics.record_out_of_range();
        }

        self.timestamps.push(record.timestamp);
        for state in &mut self.channels {
            state.push(record.value(state.channel));
        }
        if record.status.is_some() {
            self.latest_status = record.status;
        }
        self.latest = Some(record);
    }

    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::trailing(
            self.timestamps.latest().copied(),
            self.window_seconds,
            self.lead_seconds,
        )
    }

    /// Builds a new snapshot from the current buffers.
    pub fn assemble(&mut self, termination: Option<Termination>) -> Arc<Snapshot> {
        self.sequence += 1;
        let snapshot = Arc::new(Snapshot {
            sequence: self.sequence,
            timestamps: self.timestamps.to_vec(),
            channels: self
                .channels
                .iter()
                .map(|state| state.series(self.margin_fraction))
                .collect(),
            time_window: self.time_window(),
            latest_status: self.latest_status,
            latest: self.latest,
            termination,
        });
        self.last_snapshot = Some(snapshot.clone());
        snapshot
    }

    /// Drains `queue` and produces this tick's snapshot.
    pub fn tick(&mut self, queue: &SampleQueue) -> TickOutcome {
        self.metrics.record_tick();
        let drain = queue.drain();
        let ingested = drain.records.len();

        if ingested == 0 && drain.end_of_stream.is_none() {
            if let Some(previous) = &self.last_snapshot {
                return TickOutcome {
                    snapshot: previous.clone(),
                    ingested,
                    changed: false,
                    finished: false,
                };
            }
        }

        for record in drain.records {
            self.ingest(record);
        }
        self.metrics.record_assembled(ingested as u64);

        let finished = drain.end_of_stream.is_some();
        if let Some(reason) = &drain.end_of_stream {
            self.logger.record(&format!(
                "queue closed ({:?}); final snapshot holds {} samples",
                reason,
                self.timestamps.len()
            ));
        }
        TickOutcome {
            snapshot: self.assemble(drain.end_of_stream),
            ingested,
            changed: true,
            finished,
        }
    }
}

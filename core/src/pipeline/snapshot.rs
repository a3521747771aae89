use crate::math::ValueRange;
use crate::prelude::FilterKind;
use crate::record::{Channel, LightStatus, Record};
use serde::{Deserialize, Serialize};

/// Why a snapshot stream ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum Termination {
    /// An external stop request.
    Stopped,
    /// The source reported the end of its data.
    Exhausted,
    /// The transport failed.
    SourceLost(String),
}

/// Horizontal display bounds in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// `[max(0, latest - window), latest + lead]`; `[0, lead]` before any data.
    pub fn trailing(latest: Option<f64>, window_seconds: f64, lead_seconds: f64) -> Self {
        let latest = latest.unwrap_or(0.0);
        Self {
            start: (latest - window_seconds).max(0.0),
            end: latest + lead_seconds,
        }
    }

    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSeries {
    pub kind: FilterKind,
    pub values: Vec<f64>,
}

/// Buffered history of one channel, aligned with [`Snapshot::timestamps`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSeries {
    pub channel: Channel,
    pub raw: Vec<f64>,
    pub smoothed: Vec<SmoothedSeries>,
    pub value_range: ValueRange,
}

impl ChannelSeries {
    pub fn smoothed(&self, kind: FilterKind) -> Option<&[f64]> {
        self.smoothed
            .iter()
            .find(|series| series.kind == kind)
            .map(|series| series.values.as_slice())
    }
}

/// Immutable per-tick view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Increments with every distinct snapshot the assembler produces.
    pub sequence: u64,
    pub timestamps: Vec<f64>,
    pub channels: Vec<ChannelSeries>,
    pub time_window: TimeWindow,
    pub latest_status: Option<LightStatus>,
    pub latest: Option<Record>,
    /// Set only on the final snapshot of a stream.
    pub termination: Option<Termination>,
}

impl Snapshot {
    pub fn channel(&self, channel: Channel) -> Option<&ChannelSeries> {
        self.channels.iter().find(|series| series.channel == channel)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn is_final(&self) -> bool {
        self.termination.is_some()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

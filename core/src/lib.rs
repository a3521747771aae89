//! Real-time telemetry core for the ESP32 LDR sensor.
//!
//! Lines arriving from a streaming source are decoded into typed records,
//! buffered in bounded sliding windows, smoothed per channel, and handed off as
//! immutable snapshots on a fixed cadence that is independent of arrival rate.

pub mod math;
pub mod pipeline;
pub mod prelude;
pub mod processing;
pub mod record;
pub mod telemetry;

pub use pipeline::{Pipeline, PipelineHandle, Snapshot, SnapshotStream, Termination};
pub use prelude::{FilterKind, PipelineConfig, SmoothingFilter, TelemetryError, TelemetryResult};
pub use record::{decode_line, Channel, DecodeError, LightStatus, Record};

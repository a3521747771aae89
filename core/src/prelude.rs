use crate::record::DecodeError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Largest buffer, queue or averaging window the pipeline accepts.
pub const MAX_CAPACITY: usize = 1 << 20;

/// Smoothing filters that can run on every channel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Exponential,
    MovingAverage,
    Kalman,
}

impl FilterKind {
    pub fn label(&self) -> &'static str {
        match self {
            FilterKind::Exponential => "exponential",
            FilterKind::MovingAverage => "moving_average",
            FilterKind::Kalman => "kalman",
        }
    }
}

/// Construction-time configuration shared by the producer and the assembler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Samples retained per channel.
    pub buffer_capacity: usize,
    /// Records the producer may queue ahead of the assembler.
    pub queue_capacity: usize,
    pub smoothing_alpha: f64,
    pub moving_average_window: usize,
    pub kalman_process_variance: f64,
    pub kalman_measurement_variance: f64,
    pub window_seconds: f64,
    pub lead_seconds: f64,
    pub tick_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub margin_fraction: f64,
    /// Filters applied to every channel, in output order.
    pub filters: Vec<FilterKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: 150,
            queue_capacity: 256,
            smoothing_alpha: 0.2,
            moving_average_window: 5,
            kalman_process_variance: 0.01,
            kalman_measurement_variance: 0.1,
            window_seconds: 25.0,
            lead_seconds: 2.0,
            tick_interval_ms: 30,
            poll_interval_ms: 10,
            margin_fraction: 0.15,
            filters: vec![FilterKind::Exponential],
        }
    }
}

impl PipelineConfig {
    /// Rejects every parameter the pipeline could not run with.
    pub fn validate(&self) -> TelemetryResult<()> {
        if !(self.smoothing_alpha > 0.0 && self.smoothing_alpha <= 1.0) {
            return Err(TelemetryError::FilterConfig(format!(
                "smoothing_alpha must be in (0, 1], got {}",
                self.smoothing_alpha
            )));
        }
        bounded_capacity("moving_average_window", self.moving_average_window)?;
        positive("kalman_process_variance", self.kalman_process_variance)?;
        positive(
            "kalman_measurement_variance",
            self.kalman_measurement_variance,
        )?;
        bounded_capacity("buffer_capacity", self.buffer_capacity)?;
        bounded_capacity("queue_capacity", self.queue_capacity)?;
        positive("window_seconds", self.window_seconds)?;
        non_negative("lead_seconds", self.lead_seconds)?;
        non_negative("margin_fraction", self.margin_fraction)?;
        if self.tick_interval_ms == 0 || self.poll_interval_ms == 0 {
            return Err(TelemetryError::FilterConfig(
                "tick_interval_ms and poll_interval_ms must be positive".into(),
            ));
        }

        let mut seen = HashSet::new();
        for kind in &self.filters {
            if !seen.insert(*kind) {
                return Err(TelemetryError::FilterConfig(format!(
                    "filter `{}` configured more than once",
                    kind.label()
                )));
            }
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn bounded_capacity(name: &str, value: usize) -> TelemetryResult<()> {
    if (1..=MAX_CAPACITY).contains(&value) {
        Ok(())
    } else {
        Err(TelemetryError::FilterConfig(format!(
            "{} must be in 1..={}, got {}",
            name, MAX_CAPACITY, value
        )))
    }
}

fn positive(name: &str, value: f64) -> TelemetryResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(TelemetryError::FilterConfig(format!(
            "{} must be a positive finite number, got {}",
            name, value
        )))
    }
}

fn non_negative(name: &str, value: f64) -> TelemetryResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(TelemetryError::FilterConfig(format!(
            "{} must be a non-negative finite number, got {}",
            name, value
        )))
    }
}

/// Error taxonomy of the pipeline.
///
/// Decode and overflow failures are absorbed where they happen and only show
/// up in the counters. Configuration failures surface from construction.
/// `SourceUnavailable` is the single runtime failure that ends a pipeline.
#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("decode failure: {0}")]
    Decode(#[from] DecodeError),
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("queue overflow: capacity {capacity} reached, oldest record evicted")]
    QueueOverflow { capacity: usize },
    #[error("invalid filter configuration: {0}")]
    FilterConfig(String),
    #[error("runtime failure: {0}")]
    Runtime(String),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;

/// Stateful per-channel smoothing.
///
/// Output depends only on the inputs seen so far and the construction
/// parameters, so replaying a sequence reproduces it exactly.
pub trait SmoothingFilter: Send {
    fn kind(&self) -> FilterKind;
    fn apply(&mut self, raw: f64) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }

    #[test]
    fn alpha_outside_unit_interval_is_rejected() {
        for alpha in [0.0, -0.1, 1.5, f64::NAN] {
            let config = PipelineConfig {
                smoothing_alpha: alpha,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(TelemetryError::FilterConfig(_))
            ));
        }
        let config = PipelineConfig {
            smoothing_alpha: 1.0,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn non_positive_window_and_variances_are_rejected() {
        let configs = [
            PipelineConfig {
                moving_average_window: 0,
                ..Default::default()
            },
            PipelineConfig {
                kalman_process_variance: 0.0,
                ..Default::default()
            },
            PipelineConfig {
                kalman_measurement_variance: -1.0,
                ..Default::default()
            },
            PipelineConfig {
                buffer_capacity: 0,
                ..Default::default()
            },
            PipelineConfig {
                tick_interval_ms: 0,
                ..Default::default()
            },
        ];
        for config in configs {
            assert!(matches!(
                config.validate(),
                Err(TelemetryError::FilterConfig(_))
            ));
        }
    }

    #[test]
    fn oversized_capacities_are_rejected() {
        let configs = [
            PipelineConfig {
                buffer_capacity: usize::MAX / 2,
                ..Default::default()
            },
            PipelineConfig {
                queue_capacity: MAX_CAPACITY + 1,
                ..Default::default()
            },
            PipelineConfig {
                moving_average_window: usize::MAX,
                ..Default::default()
            },
        ];
        for config in configs {
            assert!(matches!(
                config.validate(),
                Err(TelemetryError::FilterConfig(_))
            ));
        }
        let config = PipelineConfig {
            buffer_capacity: MAX_CAPACITY,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn duplicate_filters_are_rejected() {
        let config = PipelineConfig {
            filters: vec![FilterKind::Kalman, FilterKind::Kalman],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_config_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"smoothing_alpha": 0.5, "filters": ["moving_average"]}"#)
                .unwrap();
        assert_eq!(config.smoothing_alpha, 0.5);
        assert_eq!(config.filters, vec![FilterKind::MovingAverage]);
        assert_eq!(config.buffer_capacity, 150);
    }
}

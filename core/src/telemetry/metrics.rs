use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Point-in-time copy of the pipeline counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineCounters {
    pub lines_decoded: u64,
    pub decode_errors: u64,
    pub queue_overflows: u64,
    pub records_assembled: u64,
    pub out_of_range: u64,
    pub reordered: u64,
    pub source_failures: u64,
    pub ticks: u64,
}

/// Counters for every failure the pipeline absorbs instead of propagating.
pub struct MetricsRecorder {
    inner: Mutex<PipelineCounters>,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PipelineCounters::default()),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut PipelineCounters)) {
        if let Ok(mut counters) = self.inner.lock() {
            apply(&mut counters);
        }
    }

    pub fn record_decoded(&self) {
        self.update(|c| c.lines_decoded += 1);
    }

    pub fn record_decode_error(&self) {
        self.update(|c| c.decode_errors += 1);
    }

    pub fn record_overflow(&self) {
        self.update(|c| c.queue_overflows += 1);
    }

    pub fn record_assembled(&self, count: u64) {
        self.update(|c| c.records_assembled += count);
    }

    pub fn record_out_of_range(&self) {
        self.update(|c| c.out_of_range += 1);
    }

    pub fn record_reordered(&self) {
        self.update(|c| c.reordered += 1);
    }

    pub fn record_source_failure(&self) {
        self.update(|c| c.source_failures += 1);
    }

    pub fn record_tick(&self) {
        self.update(|c| c.ticks += 1);
    }

    pub fn snapshot(&self) -> PipelineCounters {
        self.inner
            .lock()
            .map(|counters| *counters)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_independently() {
        let metrics = MetricsRecorder::new();
        metrics.record_decoded();
        metrics.record_decoded();
        metrics.record_decode_error();
        metrics.record_overflow();
        metrics.record_assembled(5);
        metrics.record_tick();

        let counters = metrics.snapshot();
        assert_eq!(counters.lines_decoded, 2);
        assert_eq!(counters.decode_errors, 1);
        assert_eq!(counters.queue_overflows, 1);
        assert_eq!(counters.records_assembled, 5);
        assert_eq!(counters.ticks, 1);
        assert_eq!(counters.source_failures, 0);
    }
}

use crate::math::StatsHelper;
use crate::prelude::{FilterKind, SmoothingFilter, TelemetryError, TelemetryResult};
use crate::processing::ring_buffer::RingBuffer;

/// Mean of the trailing `window` raw values.
///
/// Before the window fills, the mean covers only the samples seen so far.
#[derive(Debug, Clone)]
pub struct MovingAverageFilter {
    window: RingBuffer<f64>,
}

impl MovingAverageFilter {
    pub fn new(window: usize) -> TelemetryResult<Self> {
        if window == 0 {
            return Err(TelemetryError::FilterConfig(
                "moving average window must be positive".into(),
            ));
        }
        Ok(Self {
            window: RingBuffer::with_capacity(window)?,
        })
    }
}

impl SmoothingFilter for MovingAverageFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::MovingAverage
    }

    fn apply(&mut self, raw: f64) -> f64 {
        self.window.push(raw);
        StatsHelper::mean(self.window.iter().copied()).unwrap_or(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_of_three() {
        let mut filter = MovingAverageFilter::new(3).unwrap();
        let outputs: Vec<f64> = [1.0, 2.0, 3.0, 4.0]
            .into_iter()
            .map(|raw| filter.apply(raw))
            .collect();
        assert_eq!(outputs, vec![1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn window_of_one_is_identity() {
        let mut filter = MovingAverageFilter::new(1).unwrap();
        assert_eq!(filter.apply(5.0), 5.0);
        assert_eq!(filter.apply(9.0), 9.0);
    }

    #[test]
    fn zero_window_is_rejected() {
        assert!(MovingAverageFilter::new(0).is_err());
    }
}

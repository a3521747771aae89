use crate::prelude::{FilterKind, SmoothingFilter, TelemetryError, TelemetryResult};

/// Scalar Kalman estimator with constant variances and no motion model.
///
/// There is no prediction step, so the error variance only shrinks:
/// `P <- (1 - K) * P` after every update.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    process_variance: f64,
    measurement_variance: f64,
    state: Option<KalmanState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanState {
    pub estimate: f64,
    pub error_variance: f64,
}

impl KalmanFilter {
    pub fn new(process_variance: f64, measurement_variance: f64) -> TelemetryResult<Self> {
        for (name, value) in [
            ("process variance", process_variance),
            ("measurement variance", measurement_variance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TelemetryError::FilterConfig(format!(
                    "kalman {} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(Self {
            process_variance,
            measurement_variance,
            state: None,
        })
    }

    pub fn state(&self) -> Option<KalmanState> {
        self.state
    }
}

impl SmoothingFilter for KalmanFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Kalman
    }

    fn apply(&mut self, raw: f64) -> f64 {
        let next = match self.state {
            None => KalmanState {
                estimate: raw,
                error_variance: self.process_variance,
            },
            Some(KalmanState {
                estimate,
                error_variance,
            }) => {
                let gain = error_variance / (error_variance + self.measurement_variance);
                KalmanState {
                    estimate: estimate + gain * (raw - estimate),
                    error_variance: (1.0 - gain) * error_variance,
                }
            }
        };
        self.state = Some(next);
        next.estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_initializes_state() {
        let mut filter = KalmanFilter::new(0.01, 0.1).unwrap();
        assert_eq!(filter.apply(1234.0), 1234.0);
        assert_eq!(
            filter.state(),
            Some(KalmanState {
                estimate: 1234.0,
                error_variance: 0.01
            })
        );
    }

    #[test]
    fn single_update_matches_hand_computation() {
        let mut filter = KalmanFilter::new(1.0, 1.0).unwrap();
        filter.apply(0.0);
        let estimate = filter.apply(10.0);
        assert!((estimate - 5.0).abs() < 1e-12);
        let state = filter.state().unwrap();
        assert!((state.error_variance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn constant_input_converges_for_any_initial_variance() {
        let target = 2.5;
        for process_variance in [1e-4, 0.01, 1.0, 100.0] {
            let mut filter = KalmanFilter::new(process_variance, 0.1).unwrap();
            let mut estimate = 0.0;
            for _ in 0..1000 {
                estimate = filter.apply(target);
            }
            assert!((estimate - target).abs() < 1e-9);
        }
    }

    #[test]
    fn pulls_toward_constant_input_from_offset_start() {
        let mut filter = KalmanFilter::new(1.0, 0.1).unwrap();
        filter.apply(0.0);
        let mut estimate = 0.0;
        for _ in 0..10_000 {
            estimate = filter.apply(1.0);
        }
        assert!((estimate - 1.0).abs() < 1e-3);
    }

    #[test]
    fn error_variance_never_grows() {
        let mut filter = KalmanFilter::new(0.5, 0.1).unwrap();
        let mut previous = f64::INFINITY;
        for raw in [3.0, 9.0, -4.0, 2.0, 2.0, 100.0] {
            filter.apply(raw);
            let variance = filter.state().unwrap().error_variance;
            assert!(variance <= previous);
            previous = variance;
        }
    }

    #[test]
    fn non_positive_variances_are_rejected() {
        assert!(KalmanFilter::new(0.0, 0.1).is_err());
        assert!(KalmanFilter::new(0.01, -0.1).is_err());
    }
}

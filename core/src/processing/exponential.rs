use crate::prelude::{FilterKind, SmoothingFilter, TelemetryError, TelemetryResult};

/// Single-pole recursive smoother weighting the newest sample by `alpha`.
#[derive(Debug, Clone)]
pub struct ExponentialFilter {
    alpha: f64,
    smoothed: Option<f64>,
}

impl ExponentialFilter {
    pub fn new(alpha: f64) -> TelemetryResult<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(TelemetryError::FilterConfig(format!(
                "exponential alpha must be in (0, 1], got {}",
                alpha
            )));
        }
        Ok(Self {
            alpha,
            smoothed: None,
        })
    }
}

impl SmoothingFilter for ExponentialFilter {
    fn kind(&self) -> FilterKind {
        FilterKind::Exponential
    }

    fn apply(&mut self, raw: f64) -> f64 {
        let next = match self.smoothed {
            None => raw,
            Some(previous) => self.alpha * raw + (1.0 - self.alpha) * previous,
        };
        self.smoothed = Some(next);
        next
    }
}

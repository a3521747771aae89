use serde::{Deserialize, Serialize};

/// Closed interval `[min, max]` used for physical bounds and display ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Intersects with `bounds`. A degenerate result collapses to `bounds`.
    pub fn clamp_within(&self, bounds: ValueRange) -> ValueRange {
        let min = self.min.max(bounds.min);
        let max = self.max.min(bounds.max);
        if min < max {
            ValueRange { min, max }
        } else {
            bounds
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_within_trims_both_edges() {
        let clamped = ValueRange::new(-5.0, 120.0).clamp_within(ValueRange::new(0.0, 100.0));
        assert_eq!(clamped, ValueRange::new(0.0, 100.0));

        let inner = ValueRange::new(10.0, 20.0).clamp_within(ValueRange::new(0.0, 100.0));
        assert_eq!(inner, ValueRange::new(10.0, 20.0));
    }

    #[test]
    fn degenerate_clamp_falls_back_to_bounds() {
        let bounds = ValueRange::new(0.0, 4095.0);
        assert_eq!(ValueRange::new(5000.0, 5100.0).clamp_within(bounds), bounds);
        assert_eq!(ValueRange::new(42.0, 42.0).clamp_within(bounds), bounds);
    }

    #[test]
    fn contains_is_inclusive() {
        let range = ValueRange::new(0.0, 3.3);
        assert!(range.contains(0.0));
        assert!(range.contains(3.3));
        assert!(!range.contains(3.31));
    }
}

use crate::prelude::{FilterKind, PipelineConfig, SmoothingFilter, TelemetryResult};
use crate::processing::{ExponentialFilter, KalmanFilter, MovingAverageFilter};

/// Builds one filter of `kind` from the configured parameters.
pub fn build_filter(
    kind: FilterKind,
    config: &PipelineConfig,
) -> TelemetryResult<Box<dyn SmoothingFilter>> {
    let filter: Box<dyn SmoothingFilter> = match kind {
        FilterKind::Exponential => Box::new(ExponentialFilter::new(config.smoothing_alpha)?),
        FilterKind::MovingAverage => {
            Box::new(MovingAverageFilter::new(config.moving_average_window)?)
        }
        FilterKind::Kalman => Box::new(KalmanFilter::new(
            config.kalman_process_variance,
            config.kalman_measurement_variance,
        )?),
    };
    Ok(filter)
}

/// The filters owned by a single channel, in configured order.
pub struct FilterBank {
    filters: Vec<Box<dyn SmoothingFilter>>,
}

impl FilterBank {
    pub fn from_config(config: &PipelineConfig) -> TelemetryResult<Self> {
        let filters = config
            .filters
            .iter()
            .map(|kind| build_filter(*kind, config))
            .collect::<TelemetryResult<Vec<_>>>()?;
        Ok(Self { filters })
    }

    pub fn kinds(&self) -> impl Iterator<Item = FilterKind> + '_ {
        self.filters.iter().map(|filter| filter.kind())
    }

    /// Feeds `raw` to every filter, yielding each smoothed output.
    pub fn apply(&mut self, raw: f64) -> impl Iterator<Item = (FilterKind, f64)> + '_ {
        self.filters
            .iter_mut()
            .map(move |filter| (filter.kind(), filter.apply(raw)))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(filters: Vec<FilterKind>) -> PipelineConfig {
        PipelineConfig {
            smoothing_alpha: 0.5,
            moving_average_window: 2,
            filters,
            ..Default::default()
        }
    }

    #[test]
    fn bank_runs_filters_in_configured_order() {
        let mut bank = FilterBank::from_config(&config_with(vec![
            FilterKind::MovingAverage,
            FilterKind::Exponential,
        ]))
        .unwrap();
        assert_eq!(
            bank.kinds().collect::<Vec<_>>(),
            vec![FilterKind::MovingAverage, FilterKind::Exponential]
        );

        let _ = bank.apply(10.0).count();
        let outputs: Vec<(FilterKind, f64)> = bank.apply(20.0).collect();
        assert_eq!(
            outputs,
            vec![
                (FilterKind::MovingAverage, 15.0),
                (FilterKind::Exponential, 15.0)
            ]
        );
    }

    #[test]
    fn banks_do_not_share_state() {
        let config = config_with(vec![FilterKind::Exponential]);
        let mut first = FilterBank::from_config(&config).unwrap();
        let mut second = FilterBank::from_config(&config).unwrap();
        let _ = first.apply(100.0).count();
        let from_second: Vec<_> = second.apply(0.0).collect();
        assert_eq!(from_second, vec![(FilterKind::Exponential, 0.0)]);
    }

    #[test]
    fn invalid_parameters_fail_bank_construction() {
        let config = PipelineConfig {
            kalman_measurement_variance: 0.0,
            filters: vec![FilterKind::Kalman],
            ..Default::default()
        };
        assert!(FilterBank::from_config(&config).is_err());
    }

    #[test]
    fn empty_filter_list_builds_empty_bank() {
        let bank = FilterBank::from_config(&config_with(Vec::new())).unwrap();
        assert!(bank.is_empty());
    }
}

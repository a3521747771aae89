pub struct StatsHelper;

impl StatsHelper {
    /// Arithmetic mean, `None` for an empty sequence.
    pub fn mean<I>(values: I) -> Option<f64>
    where
        I: IntoIterator<Item = f64>,
    {
        let (sum, count) = values
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    pub fn min_max<I>(values: I) -> Option<(f64, f64)>
    where
        I: IntoIterator<Item = f64>,
    {
        values.into_iter().fold(None, |acc, value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_sequence_is_none() {
        assert_eq!(StatsHelper::mean(std::iter::empty()), None);
    }

    #[test]
    fn mean_uses_every_value() {
        assert_eq!(StatsHelper::mean([1.0, 2.0, 3.0, 6.0]), Some(3.0));
    }

    #[test]
    fn min_max_tracks_extremes() {
        assert_eq!(StatsHelper::min_max([3.0, -1.0, 7.5, 2.0]), Some((-1.0, 7.5)));
        assert_eq!(StatsHelper::min_max([4.0]), Some((4.0, 4.0)));
        assert_eq!(StatsHelper::min_max(Vec::new()), None);
    }
}

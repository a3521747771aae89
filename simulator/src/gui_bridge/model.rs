use ldrcore::telemetry::PipelineCounters;
use ldrcore::{Channel, Snapshot};
use std::sync::Arc;

/// Latest state served to presentation clients.
#[derive(Debug, Clone, Default)]
pub struct BridgeModel {
    pub snapshot: Option<Arc<Snapshot>>,
    pub counters: PipelineCounters,
}

impl BridgeModel {
    /// One-line summary of the newest reading.
    pub fn status_line(&self) -> String {
        match self.snapshot.as_ref().and_then(|snapshot| snapshot.latest) {
            Some(record) => format!(
                "ADC: {} | Voltage: {:.2} V | Light: {:.1}% | Status: {}",
                record.adc,
                record.voltage,
                record.light_percent,
                record
                    .status
                    .map(|status| status.label())
                    .unwrap_or("n/a")
            ),
            None => "waiting for data".to_string(),
        }
    }

    /// Display bounds of `channel` in the newest snapshot.
    pub fn value_range(&self, channel: Channel) -> Option<(f64, f64)> {
        let series = self.snapshot.as_ref()?.channel(channel)?;
        Some((series.value_range.min, series.value_range.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldrcore::pipeline::TimeWindow;
    use ldrcore::{LightStatus, Record};

    #[test]
    fn status_line_reports_latest_record() {
        let record = Record::new(2048, 1.65, 50.0, 1.0).with_status(LightStatus::Medium);
        let model = BridgeModel {
            snapshot: Some(Arc::new(Snapshot {
                sequence: 1,
                timestamps: vec![1.0],
                channels: Vec::new(),
                time_window: TimeWindow::trailing(Some(1.0), 25.0, 2.0),
                latest_status: Some(LightStatus::Medium),
                latest: Some(record),
                termination: None,
            })),
            counters: PipelineCounters::default(),
        };
        assert_eq!(
            model.status_line(),
            "ADC: 2048 | Voltage: 1.65 V | Light: 50.0% | Status: medium light"
        );
        assert_eq!(model.value_range(Channel::Adc), None);
    }

    #[test]
    fn empty_model_is_waiting() {
        assert_eq!(BridgeModel::default().status_line(), "waiting for data");
    }
}

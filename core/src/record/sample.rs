use crate::math::ValueRange;
use crate::record::LightStatus;
use serde::{Deserialize, Serialize};

/// One decoded sensor sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub adc: u16,
    pub voltage: f64,
    pub light_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LightStatus>,
    /// Seconds since acquisition started.
    pub timestamp: f64,
}

impl Record {
    pub fn new(adc: u16, voltage: f64, light_percent: f64, timestamp: f64) -> Self {
        Self {
            adc,
            voltage,
            light_percent,
            status: None,
            timestamp,
        }
    }

    pub fn with_status(mut self, status: LightStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Adc => f64::from(self.adc),
            Channel::Voltage => self.voltage,
            Channel::Light => self.light_percent,
        }
    }

    /// Channels whose value falls outside the physical bounds.
    pub fn out_of_range_channels(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL
            .into_iter()
            .filter(move |channel| !channel.bounds().contains(self.value(*channel)))
    }
}

/// Measurement channels carried by every record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Adc,
    Voltage,
    Light,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Adc, Channel::Voltage, Channel::Light];

    /// Static physical bounds of the 12-bit ADC front end.
    pub fn bounds(&self) -> ValueRange {
        match self {
            Channel::Adc => ValueRange::new(0.0, 4095.0),
            Channel::Voltage => ValueRange::new(0.0, 3.3),
            Channel::Light => ValueRange::new(0.0, 100.0),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Adc => "adc",
            Channel::Voltage => "voltage",
            Channel::Light => "light",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Channel::Adc => 0,
            Channel::Voltage => 1,
            Channel::Light => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_reads_each_channel() {
        let record = Record::new(2048, 1.65, 50.0, 0.5);
        assert_eq!(record.value(Channel::Adc), 2048.0);
        assert_eq!(record.value(Channel::Voltage), 1.65);
        assert_eq!(record.value(Channel::Light), 50.0);
    }

    #[test]
    fn out_of_range_values_are_flagged_not_rejected() {
        let record = Record::new(5000, 3.4, 50.0, 0.0);
        let flagged: Vec<Channel> = record.out_of_range_channels().collect();
        assert_eq!(flagged, vec![Channel::Adc, Channel::Voltage]);
        assert_eq!(Record::new(10, 0.0, 0.2, 0.0).out_of_range_channels().count(), 0);
    }

    #[test]
    fn channel_index_matches_all_order() {
        for (position, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), position);
        }
    }
}

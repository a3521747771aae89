use serde::{Deserialize, Serialize};

/// Light classification reported by the sensor firmware.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LightStatus {
    Dark,
    Low,
    Medium,
    Bright,
    /// Any code outside the firmware table.
    Unknown,
}

impl LightStatus {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => LightStatus::Dark,
            1 => LightStatus::Low,
            2 => LightStatus::Medium,
            3 => LightStatus::Bright,
            _ => LightStatus::Unknown,
        }
    }

    pub fn code(&self) -> Option<u8> {
        match self {
            LightStatus::Dark => Some(0),
            LightStatus::Low => Some(1),
            LightStatus::Medium => Some(2),
            LightStatus::Bright => Some(3),
            LightStatus::Unknown => None,
        }
    }

    /// Firmware thresholds on the light percentage.
    pub fn classify(light_percent: f64) -> Self {
        if light_percent < 20.0 {
            LightStatus::Dark
        } else if light_percent < 50.0 {
            LightStatus::Low
        } else if light_percent < 80.0 {
            LightStatus::Medium
        } else {
            LightStatus::Bright
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LightStatus::Dark => "dark",
            LightStatus::Low => "low light",
            LightStatus::Medium => "medium light",
            LightStatus::Bright => "bright",
            LightStatus::Unknown => "unknown",
        }
    }
}

use crate::generator::template::{light_to_adc, light_wave};
use anyhow::ensure;
use ldrcore::pipeline::{ByteSource, SourcePoll};
use ldrcore::{LightStatus, TelemetryResult};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

const ADC_MAX: u32 = 4095;
const MAX_LINES_PER_POLL: u64 = 64;
/// Upper bound on ADC reads averaged into one reading.
pub const MAX_SAMPLES_PER_READING: u32 = 4096;
const MALFORMED_LINES: [&str; 4] = ["ADC:", "1024,", "nan,nan,nan", "\u{1b}[0m boot"];

/// Configuration for the synthetic LDR sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Readings per second.
    pub rate_hz: f64,
    pub seed: u64,
    /// Peak jitter of a single ADC read, in counts.
    pub noise: f64,
    pub period_secs: f64,
    pub base_light: f64,
    pub swing: f64,
    /// ADC reads averaged into one reading.
    pub samples_per_reading: u32,
    /// Probability that a reading is replaced by a garbled line.
    pub malformed_rate: f64,
    /// Stop after this many readings.
    pub limit: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            seed: 0,
            noise: 40.0,
            period_secs: 20.0,
            base_light: 50.0,
            swing: 35.0,
            samples_per_reading: 10,
            malformed_rate: 0.0,
            limit: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.rate_hz.is_finite() && self.rate_hz > 0.0,
            "generator rate_hz must be positive, got {}",
            self.rate_hz
        );
        ensure!(
            self.noise.is_finite() && self.noise >= 0.0,
            "generator noise must be non-negative, got {}",
            self.noise
        );
        ensure!(
            (1..=MAX_SAMPLES_PER_READING).contains(&self.samples_per_reading),
            "generator samples_per_reading must be in 1..={}, got {}",
            MAX_SAMPLES_PER_READING,
            self.samples_per_reading
        );
        ensure!(
            (0.0..=1.0).contains(&self.malformed_rate),
            "generator malformed_rate must be in [0, 1], got {}",
            self.malformed_rate
        );
        Ok(())
    }
}

/// One averaged reading, computed the way the firmware does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub adc: u32,
    pub voltage_mv: u32,
    pub light_percent: f64,
    pub status: LightStatus,
}

impl Reading {
    pub fn from_adc(adc: u32) -> Self {
        let adc = adc.min(ADC_MAX);
        let light_percent = adc as f64 / ADC_MAX as f64 * 100.0;
        Self {
            adc,
            voltage_mv: adc * 3300 / ADC_MAX,
            light_percent,
            status: LightStatus::classify(light_percent),
        }
    }

    /// `adc,voltage,light,status` as printed over the serial port.
    pub fn to_line(&self) -> String {
        format!(
            "{},{:.2},{:.1},{}\n",
            self.adc,
            self.voltage_mv as f64 / 1000.0,
            self.light_percent,
            self.status.code().unwrap_or_default()
        )
    }
}

/// Deterministic stream of sensor lines for a given seed.
pub struct ReadingGenerator {
    config: GeneratorConfig,
    rng: StdRng,
    emitted: u64,
}

impl ReadingGenerator {
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            emitted: 0,
        })
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn is_exhausted(&self) -> bool {
        self.config
            .limit
            .map_or(false, |limit| self.emitted >= limit)
    }

    fn read_adc(&mut self, level: f64) -> u32 {
        let jitter = if self.config.noise > 0.0 {
            self.rng.gen_range(-self.config.noise..=self.config.noise)
        } else {
            0.0
        };
        (level + jitter).round().clamp(0.0, ADC_MAX as f64) as u32
    }

    pub fn next_reading(&mut self) -> Reading {
        let t = self.emitted as f64 / self.config.rate_hz;
        let level = light_to_adc(light_wave(
            t,
            self.config.period_secs,
            self.config.base_light,
            self.config.swing,
        ));
        let reads = self.config.samples_per_reading.max(1);
        let total: u64 = (0..reads).map(|_| u64::from(self.read_adc(level))).sum();
        self.emitted += 1;
        Reading::from_adc((total / u64::from(reads)) as u32)
    }

    /// Next line, possibly garbled when `malformed_rate` is set.
    pub fn next_line(&mut self) -> String {
        let reading = self.next_reading();
        if self.config.malformed_rate > 0.0 && self.rng.gen_bool(self.config.malformed_rate) {
            let garbage = MALFORMED_LINES[self.rng.gen_range(0..MALFORMED_LINES.len())];
            return format!("{}\n", garbage);
        }
        reading.to_line()
    }
}

/// [`ByteSource`] that releases generated lines at `rate_hz` of wall time.
pub struct SyntheticSource {
    generator: ReadingGenerator,
    started: Option<Instant>,
    pending: Vec<u8>,
    rate_hz: f64,
}

impl SyntheticSource {
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        let rate_hz = config.rate_hz;
        Ok(Self {
            generator: ReadingGenerator::new(config)?,
            started: None,
            pending: Vec::new(),
            rate_hz,
        })
    }

    fn due(&mut self) -> u64 {
        let started = *self.started.get_or_insert_with(Instant::now);
        (started.elapsed().as_secs_f64() * self.rate_hz) as u64 + 1
    }
}

impl ByteSource for SyntheticSource {
    fn poll(&mut self, buf: &mut [u8]) -> TelemetryResult<SourcePoll> {
        if self.pending.is_empty() {
            let due = self.due();
            let mut produced = 0;
            while self.generator.emitted() < due
                && produced < MAX_LINES_PER_POLL
                && !self.generator.is_exhausted()
            {
                let line = self.generator.next_line();
                self.pending.extend_from_slice(line.as_bytes());
                produced += 1;
            }
        }

        if self.pending.is_empty() {
            return Ok(if self.generator.is_exhausted() {
                SourcePoll::Closed
            } else {
                SourcePoll::Idle
            });
        }

        let count = buf.len().min(self.pending.len());
        buf[..count].copy_from_slice(&self.pending[..count]);
        self.pending.drain(..count);
        Ok(SourcePoll::Data(count))
    }

    fn describe(&self) -> String {
        format!("synthetic LDR at {} Hz", self.rate_hz)
    }
}

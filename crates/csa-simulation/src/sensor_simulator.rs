//! Simulated microcontroller sensor
//!
//! Produces the line-oriented integer stream an ADC sketch prints over a
//! serial link, so acquisition and period estimation can run without
//! hardware.

use csa_core::{CsaError, CsaResult};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::io::Cursor;

/// Configuration for the simulated sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorSimConfig {
    /// Time between samples in seconds
    pub sample_interval: f64,
    /// Frequency of the sensed signal in Hz
    pub frequency: f64,
    /// ADC offset (mid-scale)
    pub offset: f64,
    /// Signal amplitude in ADC counts
    pub amplitude: f64,
    /// Gaussian noise standard deviation in ADC counts
    pub noise_std: f64,
    /// Fraction of lines replaced by garbage (0.0 to 1.0)
    pub garbage_ratio: f64,
    /// ADC full-scale value; samples are clamped to [0, adc_max]
    pub adc_max: i64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SensorSimConfig {
    fn default() -> Self {
        Self {
            sample_interval: 0.005,
            frequency: 10.0,
            offset: 512.0,
            amplitude: 300.0,
            noise_std: 10.0,
            garbage_ratio: 0.02,
            adc_max: 1023,
            seed: None,
        }
    }
}

/// Garbage lines a serial link can deliver: partial reads, boot banners, blanks
const GARBAGE_LINES: [&str; 4] = ["", "5l2", "Sensor ready", "\u{fffd}\u{fffd}"];

/// Line generator for a simulated ADC
pub struct SensorSimulator {
    config: SensorSimConfig,
    rng: rand::rngs::StdRng,
    normal_dist: Normal<f64>,
    sample_index: u64,
}

impl SensorSimulator {
    pub fn new(config: SensorSimConfig) -> CsaResult<Self> {
        if !(config.sample_interval > 0.0) {
            return Err(CsaError::ConfigurationError {
                message: format!("Sample interval must be positive, got {}", config.sample_interval),
            });
        }
        if !(0.0..=1.0).contains(&config.garbage_ratio) {
            return Err(CsaError::ConfigurationError {
                message: "Garbage ratio must be between 0.0 and 1.0".to_string(),
            });
        }

        let seed = config.seed.unwrap_or_else(rand::random);
        let rng = rand::rngs::StdRng::seed_from_u64(seed);
        let normal_dist = Normal::new(0.0, config.noise_std)
            .map_err(|e| CsaError::ConfigurationError {
                message: format!("Failed to create normal distribution: {}", e),
            })?;

        Ok(SensorSimulator {
            config,
            rng,
            normal_dist,
            sample_index: 0,
        })
    }

    pub fn config(&self) -> &SensorSimConfig {
        &self.config
    }

    /// Next clean ADC reading
    pub fn next_sample(&mut self) -> i64 {
        let t = self.sample_index as f64 * self.config.sample_interval;
        self.sample_index += 1;

        let clean = self.config.offset
            + self.config.amplitude * (2.0 * PI * self.config.frequency * t).sin();
        let noisy = clean + self.normal_dist.sample(&mut self.rng);

        (noisy.round() as i64).clamp(0, self.config.adc_max)
    }

    /// Next line as printed on the serial link, possibly garbage
    pub fn next_line(&mut self) -> String {
        if self.rng.gen::<f64>() < self.config.garbage_ratio {
            let idx = self.rng.gen_range(0..GARBAGE_LINES.len());
            return format!("{}\r\n", GARBAGE_LINES[idx]);
        }
        format!("{}\r\n", self.next_sample())
    }

    /// Render lines until `valid_samples` parseable readings have been emitted
    pub fn render(&mut self, valid_samples: usize) -> String {
        let mut out = String::new();
        let mut emitted = 0;
        while emitted < valid_samples {
            let line = self.next_line();
            if line.trim().parse::<i64>().is_ok() {
                emitted += 1;
            }
            out.push_str(&line);
        }
        out
    }

    /// In-memory byte stream standing in for a serial port
    pub fn into_reader(mut self, valid_samples: usize) -> Cursor<Vec<u8>> {
        Cursor::new(self.render(valid_samples).into_bytes())
    }

    /// Period of the sensed signal in samples
    pub fn expected_period_samples(&self) -> f64 {
        1.0 / (self.config.frequency * self.config.sample_interval)
    }

    pub fn reset(&mut self) {
        self.sample_index = 0;
    }
}

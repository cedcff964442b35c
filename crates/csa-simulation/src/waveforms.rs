//! Periodic test waveforms

use csa_core::{CsaError, CsaResult, Signal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Analytic waveform evaluated at arbitrary times
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Waveform {
    /// Constant level
    Constant { level: f64 },
    /// `amplitude * sin(2*pi*f*t + phase)`
    Sine {
        frequency: f64,
        amplitude: f64,
        phase: f64,
    },
    /// Symmetric triangle in [-amplitude, amplitude], rising through zero at t = 0
    Triangle { frequency: f64, amplitude: f64 },
    /// Rising ramp in [-amplitude, amplitude), centred on t = 0
    Sawtooth { frequency: f64, amplitude: f64 },
}

impl Waveform {
    pub fn sine(frequency: f64, amplitude: f64) -> Self {
        Waveform::Sine { frequency, amplitude, phase: 0.0 }
    }

    /// Value at time `t` in seconds
    pub fn value_at(&self, t: f64) -> f64 {
        match *self {
            Waveform::Constant { level } => level,

            Waveform::Sine { frequency, amplitude, phase } => {
                amplitude * (2.0 * PI * frequency * t + phase).sin()
            }

            Waveform::Triangle { frequency, amplitude } => {
                let shifted = t * frequency + 0.25;
                let phase = shifted - shifted.floor();
                amplitude * (1.0 - 4.0 * (phase - 0.5).abs())
            }

            Waveform::Sawtooth { frequency, amplitude } => {
                let x = t * frequency;
                amplitude * 2.0 * (x - (x + 0.5).floor())
            }
        }
    }

    /// Fundamental frequency in Hz, if periodic
    pub fn frequency(&self) -> Option<f64> {
        match *self {
            Waveform::Constant { .. } => None,
            Waveform::Sine { frequency, .. }
            | Waveform::Triangle { frequency, .. }
            | Waveform::Sawtooth { frequency, .. } => Some(frequency),
        }
    }

    /// Sample the waveform at `sampling_rate` over `[0, duration)`
    pub fn sample(&self, sampling_rate: f64, duration: f64) -> CsaResult<Signal> {
        let count = sample_count(sampling_rate, duration)?;
        let dt = 1.0 / sampling_rate;
        let samples = (0..count).map(|i| self.value_at(i as f64 * dt)).collect();
        Signal::new(samples, dt)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Waveform::Constant { .. } => "Constant level",
            Waveform::Sine { .. } => "Sine",
            Waveform::Triangle { .. } => "Triangle",
            Waveform::Sawtooth { .. } => "Sawtooth",
        }
    }
}

/// Number of samples covering `[0, duration)` at `sampling_rate`
pub fn sample_count(sampling_rate: f64, duration: f64) -> CsaResult<usize> {
    if !(sampling_rate > 0.0) || !sampling_rate.is_finite() {
        return Err(CsaError::InvalidSignal {
            reason: format!("Sampling rate must be positive, got {}", sampling_rate),
        });
    }
    if !(duration > 0.0) || !duration.is_finite() {
        return Err(CsaError::InvalidSignal {
            reason: format!("Duration must be positive, got {}", duration),
        });
    }
    Ok((duration * sampling_rate).round() as usize)
}

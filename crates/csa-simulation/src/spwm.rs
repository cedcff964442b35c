//! Sine-triangle PWM synthesis
//!
//! A comparator outputs 1 while the audio sine is above the carrier and 0
//! otherwise. The duty cycle in each carrier period follows the audio level.

use crate::waveforms::Waveform;
use csa_core::{CsaError, CsaResult, Signal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Carrier shape used by the comparator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarrierKind {
    Triangle,
    Sawtooth,
}

impl CarrierKind {
    /// Peak amplitude each shape is compared at: the sawtooth swings ±2
    pub fn default_amplitude(self) -> f64 {
        match self {
            CarrierKind::Triangle => 1.0,
            CarrierKind::Sawtooth => 2.0,
        }
    }
}

/// SPWM generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpwmConfig {
    /// Sampling rate in Hz
    pub sampling_rate: f64,
    /// Signal duration in seconds
    pub duration: f64,
    /// Audio (modulating) frequency in Hz
    pub audio_frequency: f64,
    /// Audio amplitude
    pub audio_amplitude: f64,
    /// Carrier shape
    pub carrier: CarrierKind,
    /// Carrier frequency in Hz
    pub carrier_frequency: f64,
    /// Carrier peak amplitude
    pub carrier_amplitude: f64,
}

impl Default for SpwmConfig {
    fn default() -> Self {
        Self {
            sampling_rate: 500_000.0,
            duration: 2e-3,
            audio_frequency: 2_000.0,
            audio_amplitude: 1.0,
            carrier: CarrierKind::Triangle,
            carrier_frequency: 44_000.0,
            carrier_amplitude: 1.0,
        }
    }
}

impl SpwmConfig {
    pub fn validate(&self) -> CsaResult<()> {
        if !(self.sampling_rate > 0.0) || !(self.duration > 0.0) {
            return Err(CsaError::ConfigurationError {
                message: "SPWM sampling rate and duration must be positive".to_string(),
            });
        }
        if !(self.audio_frequency > 0.0) || !(self.carrier_frequency > 0.0) {
            return Err(CsaError::ConfigurationError {
                message: "SPWM frequencies must be positive".to_string(),
            });
        }
        if self.carrier_frequency <= self.audio_frequency {
            return Err(CsaError::ConfigurationError {
                message: format!(
                    "Carrier frequency {} Hz must exceed audio frequency {} Hz",
                    self.carrier_frequency, self.audio_frequency
                ),
            });
        }
        if self.carrier_frequency * 2.0 > self.sampling_rate {
            return Err(CsaError::ConfigurationError {
                message: format!(
                    "Carrier frequency {} Hz is above Nyquist for {} Hz sampling",
                    self.carrier_frequency, self.sampling_rate
                ),
            });
        }
        if !(self.carrier_amplitude > 0.0) {
            return Err(CsaError::ConfigurationError {
                message: "Carrier amplitude must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Switch carrier shape and take that shape's default amplitude
    pub fn set_carrier(&mut self, kind: CarrierKind) {
        self.carrier = kind;
        self.carrier_amplitude = kind.default_amplitude();
    }

    pub fn audio_waveform(&self) -> Waveform {
        Waveform::sine(self.audio_frequency, self.audio_amplitude)
    }

    pub fn carrier_waveform(&self) -> Waveform {
        match self.carrier {
            CarrierKind::Triangle => Waveform::Triangle {
                frequency: self.carrier_frequency,
                amplitude: self.carrier_amplitude,
            },
            CarrierKind::Sawtooth => Waveform::Sawtooth {
                frequency: self.carrier_frequency,
                amplitude: self.carrier_amplitude,
            },
        }
    }

    /// Samples per carrier period, rounded
    pub fn samples_per_carrier_period(&self) -> usize {
        ((self.sampling_rate / self.carrier_frequency).round() as usize).max(1)
    }
}

/// Signals produced by one SPWM run
#[derive(Debug, Clone)]
pub struct SpwmSignals {
    pub audio: Signal,
    pub carrier: Signal,
    /// Comparator output, 0.0 or 1.0
    pub spwm: Signal,
}

/// Comparator: 1.0 where `reference > carrier`, else 0.0
pub fn compare(reference: &Signal, carrier: &Signal) -> CsaResult<Signal> {
    if reference.len() != carrier.len() {
        return Err(CsaError::LengthMismatch {
            left: reference.len(),
            right: carrier.len(),
        });
    }

    let samples = reference.samples()
        .iter()
        .zip(carrier.samples())
        .map(|(r, c)| if r > c { 1.0 } else { 0.0 })
        .collect();

    Signal::new(samples, reference.dt())
}

/// Generate audio, carrier and comparator output
pub fn generate(config: &SpwmConfig) -> CsaResult<SpwmSignals> {
    config.validate()?;

    let audio = config.audio_waveform().sample(config.sampling_rate, config.duration)?;
    let carrier = config.carrier_waveform().sample(config.sampling_rate, config.duration)?;
    let spwm = compare(&audio, &carrier)?;

    debug!(
        samples = spwm.len(),
        duty = spwm.stats().mean,
        "generated SPWM signal"
    );

    Ok(SpwmSignals { audio, carrier, spwm })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation() {
        let signals = generate(&SpwmConfig::default()).unwrap();
        assert_eq!(signals.audio.len(), 1000);
        assert_eq!(signals.carrier.len(), 1000);
        assert!(signals.spwm.samples().iter().all(|&v| v == 0.0 || v == 1.0));

        // Zero-mean audio against a symmetric carrier gives ~50% duty
        let duty = signals.spwm.stats().mean;
        assert!((duty - 0.5).abs() < 0.05, "duty {}", duty);
    }

    #[test]
    fn test_compare_length_mismatch() {
        let a = Signal::new(vec![0.0; 3], 1.0).unwrap();
        let b = Signal::new(vec![0.0; 4], 1.0).unwrap();
        assert_eq!(
            compare(&a, &b).unwrap_err(),
            CsaError::LengthMismatch { left: 3, right: 4 }
        );
    }

    #[test]
    fn test_duty_follows_level() {
        let config = SpwmConfig::default();
        let carrier = config.carrier_waveform().sample(config.sampling_rate, config.duration).unwrap();
        let high = carrier.map(|_| 0.5);
        let duty = compare(&high, &carrier).unwrap().stats().mean;
        // A level at half the carrier amplitude is above the triangle 75% of the time
        assert!((duty - 0.75).abs() < 0.05, "duty {}", duty);
    }

    #[test]
    fn test_sawtooth_carrier_swings_two() {
        let mut config = SpwmConfig::default();
        config.set_carrier(CarrierKind::Sawtooth);
        assert_eq!(config.carrier_amplitude, 2.0);

        let signals = generate(&config).unwrap();
        let stats = signals.carrier.stats();
        assert!(stats.max > 1.9 && stats.max <= 2.0, "max {}", stats.max);
        assert!(stats.min >= -2.0 && stats.min < -1.9, "min {}", stats.min);

        config.set_carrier(CarrierKind::Triangle);
        assert_eq!(config.carrier_amplitude, 1.0);
    }

    #[test]
    fn test_validation() {
        let mut config = SpwmConfig::default();
        config.carrier_frequency = 1_000.0;
        assert!(config.validate().is_err());

        let mut config = SpwmConfig::default();
        config.carrier_frequency = 300_000.0;
        assert!(config.validate().is_err());
    }
}

//! Period and frequency estimation from autocorrelation peaks

use crate::autocorrelation::autocorrelation;
use crate::peaks::find_peaks;
use csa_core::{CsaError, CsaResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default minimum spacing between autocorrelation peaks, in lags
pub const DEFAULT_PEAK_DISTANCE: usize = 5;

/// Default time between sensor samples in seconds
pub const DEFAULT_SAMPLE_INTERVAL: f64 = 0.005;

/// Result of a period estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodEstimate {
    /// Period in samples (first autocorrelation peak after lag 0)
    pub period_samples: usize,
    /// Period in seconds
    pub period_seconds: f64,
    /// Frequency in Hz
    pub frequency_hz: f64,
    /// Autocorrelation for lags `0..N`
    pub autocorrelation: Vec<f64>,
    /// All retained autocorrelation peaks
    pub peaks: Vec<usize>,
}

/// Autocorrelation-based period estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodEstimator {
    /// Minimum spacing between accepted peaks, in lags
    pub peak_distance: usize,
    /// Time between samples in seconds
    pub sample_interval: f64,
}

impl Default for PeriodEstimator {
    fn default() -> Self {
        Self {
            peak_distance: DEFAULT_PEAK_DISTANCE,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

impl PeriodEstimator {
    pub fn new(peak_distance: usize, sample_interval: f64) -> CsaResult<Self> {
        if !(sample_interval > 0.0) || !sample_interval.is_finite() {
            return Err(CsaError::ConfigurationError {
                message: format!("Sample interval must be positive, got {}", sample_interval),
            });
        }
        Ok(Self { peak_distance, sample_interval })
    }

    /// First autocorrelation peak at a non-zero lag
    pub fn detect_period(&self, autocorr: &[f64]) -> CsaResult<(usize, Vec<usize>)> {
        let peaks = find_peaks(autocorr, self.peak_distance);
        // Edges are never peaks, so every entry is a non-zero lag
        let period = peaks.first().copied().ok_or(CsaError::PeriodNotFound)?;
        Ok((period, peaks))
    }

    pub fn estimate(&self, samples: &[f64]) -> CsaResult<PeriodEstimate> {
        if samples.len() < 3 {
            return Err(CsaError::InsufficientSamples {
                context: "period estimation",
                required: 3,
                available: samples.len(),
            });
        }

        let autocorr = autocorrelation(samples)?;
        let (period_samples, peaks) = self.detect_period(&autocorr)?;
        let frequency_hz = frequency_from_period(period_samples, self.sample_interval)?;

        debug!(peaks = peaks.len(), "autocorrelation peaks found");
        info!(period_samples, frequency_hz, "period estimated");

        Ok(PeriodEstimate {
            period_samples,
            period_seconds: period_samples as f64 * self.sample_interval,
            frequency_hz,
            autocorrelation: autocorr,
            peaks,
        })
    }

    /// Convenience for integer ADC readings
    pub fn estimate_counts(&self, counts: &[i64]) -> CsaResult<PeriodEstimate> {
        let samples: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        self.estimate(&samples)
    }
}

/// Frequency in Hz for a period given in samples
pub fn frequency_from_period(period_samples: usize, sample_interval: f64) -> CsaResult<f64> {
    let period_seconds = period_samples as f64 * sample_interval;
    if period_seconds <= 0.0 {
        return Err(CsaError::InvalidSignal {
            reason: format!("Period must be positive, got {} s", period_seconds),
        });
    }
    Ok(1.0 / period_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(period: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| (2.0 * PI * i as f64 / period).sin()).collect()
    }

    #[test]
    fn test_period_of_sine() {
        let estimate = PeriodEstimator::default().estimate(&sine(20.0, 100)).unwrap();
        assert_eq!(estimate.period_samples, 20);
        assert!((estimate.frequency_hz - 10.0).abs() < 1e-9);
        assert!((estimate.period_seconds - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_period_of_square_wave() {
        let data: Vec<f64> = (0..120).map(|i| if (i / 6) % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let estimate = PeriodEstimator::default().estimate(&data).unwrap();
        assert_eq!(estimate.period_samples, 12);
    }

    #[test]
    fn test_no_period_in_ramp() {
        let ramp: Vec<f64> = (0..50).map(|i| i as f64).collect();
        assert_eq!(
            PeriodEstimator::default().estimate(&ramp).unwrap_err(),
            CsaError::PeriodNotFound
        );
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            PeriodEstimator::default().estimate(&[1.0, 2.0]),
            Err(CsaError::InsufficientSamples { available: 2, .. })
        ));
    }

    #[test]
    fn test_frequency_from_period() {
        assert!((frequency_from_period(20, 0.005).unwrap() - 10.0).abs() < 1e-9);
        assert!(frequency_from_period(0, 0.005).is_err());
    }

    #[test]
    fn test_rejects_bad_interval() {
        assert!(PeriodEstimator::new(5, 0.0).is_err());
        assert!(PeriodEstimator::new(5, -0.1).is_err());
    }
}

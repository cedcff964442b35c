//! Signal: uniformly sampled container shared by all pipelines

use crate::error::{CsaError, CsaResult};
use serde::{Deserialize, Serialize};

/// Discretized time-domain signal with a uniform sampling interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Sample values, indexed by sample number
    samples: Vec<f64>,
    /// Sampling interval in seconds
    dt: f64,
    /// Time of the first sample in seconds
    t0: f64,
}

impl Signal {
    /// Create a signal starting at t = 0
    pub fn new(samples: Vec<f64>, dt: f64) -> CsaResult<Self> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(CsaError::InvalidSignal {
                reason: format!("Sampling interval must be positive and finite, got {}", dt),
            });
        }

        Ok(Signal { samples, dt, t0: 0.0 })
    }

    /// Create a signal from a sampling rate in Hz
    pub fn from_rate(samples: Vec<f64>, sampling_rate: f64) -> CsaResult<Self> {
        if !sampling_rate.is_finite() || sampling_rate <= 0.0 {
            return Err(CsaError::InvalidSignal {
                reason: format!("Sampling rate must be positive, got {}", sampling_rate),
            });
        }
        Self::new(samples, 1.0 / sampling_rate)
    }

    /// Shift the time origin of the signal
    pub fn with_start(mut self, t0: f64) -> Self {
        self.t0 = t0;
        self
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    /// Sampling interval in seconds
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn start_time(&self) -> f64 {
        self.t0
    }

    /// Sampling rate in Hz
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.dt
    }

    /// Signal duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 * self.dt
    }

    /// Time of each sample, for plotting
    pub fn time_vector(&self) -> Vec<f64> {
        (0..self.samples.len())
            .map(|i| self.t0 + i as f64 * self.dt)
            .collect()
    }

    /// Pair each sample with its time
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(move |(i, &v)| (self.t0 + i as f64 * self.dt, v))
    }

    pub fn stats(&self) -> SignalStats {
        SignalStats::calculate(&self.samples)
    }

    /// Apply a function to every sample, keeping the time base
    pub fn map<F>(&self, f: F) -> Signal
    where
        F: Fn(f64) -> f64,
    {
        Signal {
            samples: self.samples.iter().map(|&x| f(x)).collect(),
            dt: self.dt,
            t0: self.t0,
        }
    }

    /// Copy of the signal with its mean removed
    pub fn centered(&self) -> Signal {
        let mean = self.stats().mean;
        self.map(|x| x - mean)
    }

    /// Maximum absolute sample value (0 for an empty signal)
    pub fn peak_abs(&self) -> f64 {
        self.samples.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
    }

    /// Scale so the largest magnitude is 1. All-zero signals are returned unchanged.
    pub fn normalized_peak(&self) -> Signal {
        let peak = self.peak_abs();
        if peak == 0.0 {
            return self.clone();
        }
        self.map(|x| x / peak)
    }
}

/// Basic statistics for a sample sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalStats {
    pub mean: f64,
    pub rms: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl SignalStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self {
                mean: 0.0,
                rms: 0.0,
                std_dev: 0.0,
                min: 0.0,
                max: 0.0,
                peak_to_peak: 0.0,
            };
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;

        let sum_sq: f64 = data.iter().map(|x| x * x).sum();
        let rms = (sum_sq / n).sqrt();

        let variance = data.iter()
            .map(|x| (x - mean).powi(2))
            .sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }
}

//! Single-sided FFT magnitude spectra
//!
//! Scaling follows the usual lab convention:
//! `mag[k] = 2 * |X[k]| / N` for `k < N/2`, `f[k] = k * fs / N`, and
//! `dB = 20 * log10(mag + floor)`.

use crate::config::SpectrumConfig;
use csa_core::{CsaError, CsaResult, DataTable, Signal};
use realfft::RealFftPlanner;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Default floor added before taking decibels
pub const DB_FLOOR: f64 = 1e-12;

/// Magnitude spectrum of a real signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Bin centre frequencies in Hz
    pub frequencies: Vec<f64>,
    /// Single-sided amplitude per bin
    pub magnitudes: Vec<f64>,
    /// Sampling rate of the source signal in Hz
    pub sampling_rate: f64,
    /// Number of input samples
    pub fft_size: usize,
}

/// Location and height of a spectral peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralPeak {
    pub bin: usize,
    pub frequency: f64,
    pub magnitude: f64,
}

impl SpectralPeak {
    /// Peak height in decibels, floored like `Spectrum::magnitude_db`
    pub fn magnitude_db(&self) -> f64 {
        20.0 * (self.magnitude + DB_FLOOR).log10()
    }
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    /// Frequency spacing between bins in Hz
    pub fn resolution(&self) -> f64 {
        self.sampling_rate / self.fft_size as f64
    }

    /// Magnitudes in decibels with the given floor
    pub fn magnitude_db_with_floor(&self, floor: f64) -> Vec<f64> {
        self.magnitudes
            .iter()
            .map(|m| 20.0 * (m + floor).log10())
            .collect()
    }

    pub fn magnitude_db(&self) -> Vec<f64> {
        self.magnitude_db_with_floor(DB_FLOOR)
    }

    /// Largest bin, optionally ignoring DC
    pub fn peak(&self, skip_dc: bool) -> Option<SpectralPeak> {
        let start = usize::from(skip_dc);
        self.magnitudes
            .iter()
            .enumerate()
            .skip(start)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(bin, &magnitude)| SpectralPeak {
                bin,
                frequency: self.frequencies[bin],
                magnitude,
            })
    }

    /// Keep only bins at or below `max_frequency`
    pub fn clipped(&self, max_frequency: f64) -> Spectrum {
        let keep = self.frequencies
            .iter()
            .take_while(|&&f| f <= max_frequency)
            .count();
        Spectrum {
            frequencies: self.frequencies[..keep].to_vec(),
            magnitudes: self.magnitudes[..keep].to_vec(),
            sampling_rate: self.sampling_rate,
            fft_size: self.fft_size,
        }
    }
}

/// FFT front-end that reuses plans across signals
pub struct SpectrumAnalyzer {
    planner: RealFftPlanner<f64>,
}

impl SpectrumAnalyzer {
    pub fn new() -> Self {
        SpectrumAnalyzer {
            planner: RealFftPlanner::new(),
        }
    }

    /// Compute the single-sided spectrum of `signal`
    pub fn analyze(&mut self, signal: &Signal) -> CsaResult<Spectrum> {
        let n = signal.len();
        if n == 0 {
            return Err(CsaError::EmptySignal { context: "spectrum" });
        }

        let r2c = self.planner.plan_fft_forward(n);
        let mut input = signal.samples().to_vec();
        let mut output = r2c.make_output_vec();
        r2c.process(&mut input, &mut output)
            .map_err(|e| CsaError::InvalidSignal {
                reason: format!("FFT failed: {}", e),
            })?;

        let half = n / 2;
        let scale = 2.0 / n as f64;
        let fs = signal.sampling_rate();

        let magnitudes = output[..half].iter().map(|c| c.norm() * scale).collect();
        let frequencies = (0..half).map(|k| k as f64 * fs / n as f64).collect();

        debug!(samples = n, bins = half, sampling_rate = fs, "computed spectrum");

        Ok(Spectrum {
            frequencies,
            magnitudes,
            sampling_rate: fs,
            fft_size: n,
        })
    }
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot spectrum of a signal
pub fn spectrum(signal: &Signal) -> CsaResult<Spectrum> {
    SpectrumAnalyzer::new().analyze(signal)
}

/// Time and frequency content of a simulator run (PWM input and filtered output)
#[derive(Debug, Clone)]
pub struct SimulatorSpectrum {
    pub pwm: Signal,
    pub output: Signal,
    pub pwm_spectrum: Spectrum,
    pub output_spectrum: Spectrum,
}

impl SimulatorSpectrum {
    /// Extract the configured columns from a table and transform them
    pub fn from_table(table: &DataTable, config: &SpectrumConfig) -> CsaResult<Self> {
        config.validate()?;

        let pwm = table.signal(config.time_column, config.pwm_column)?;
        let output = table.signal(config.time_column, config.output_column)?;

        let mut analyzer = SpectrumAnalyzer::new();
        let pwm_spectrum = analyzer.analyze(&pwm)?;
        let output_spectrum = analyzer.analyze(&output)?;

        if let (Some(p), Some(o)) = (pwm_spectrum.peak(true), output_spectrum.peak(true)) {
            info!(
                pwm_peak_hz = p.frequency,
                output_peak_hz = o.frequency,
                "simulator spectrum ready"
            );
        }

        Ok(SimulatorSpectrum {
            pwm,
            output,
            pwm_spectrum,
            output_spectrum,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P, config: &SpectrumConfig) -> CsaResult<Self> {
        let table = DataTable::from_file(path)?;
        Self::from_table(&table, config)
    }
}

//! Autocorrelation of mean-centred signals
//!
//! `r[k] = sum_n x[n] * x[n + k]` for lags `0..N`, i.e. the non-negative half
//! of the full linear correlation. Computed through the power spectrum of the
//! zero-padded signal, so cost is O(N log N).

use csa_core::{CsaError, CsaResult};
use num_complex::Complex;
use rustfft::FftPlanner;

/// Remove the mean from a series
pub fn center(data: &[f64]) -> Vec<f64> {
    if data.is_empty() {
        return Vec::new();
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    data.iter().map(|x| x - mean).collect()
}

/// Autocorrelation of the mean-centred input, lags `0..N`
pub fn autocorrelation(data: &[f64]) -> CsaResult<Vec<f64>> {
    let n = data.len();
    if n == 0 {
        return Err(CsaError::EmptySignal { context: "autocorrelation" });
    }

    let centered = center(data);

    // Linear (not circular) correlation needs at least 2N - 1 points
    let fft_size = (2 * n - 1).next_power_of_two();
    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(fft_size);
    let inverse = planner.plan_fft_inverse(fft_size);

    let mut buffer: Vec<Complex<f64>> = centered
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .collect();
    buffer.resize(fft_size, Complex::new(0.0, 0.0));

    forward.process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    inverse.process(&mut buffer);

    // rustfft leaves the inverse unnormalised
    let scale = 1.0 / fft_size as f64;
    Ok(buffer[..n].iter().map(|c| c.re * scale).collect())
}

/// Direct O(N^2) evaluation, kept for short series and cross-checking
pub fn autocorrelation_direct(data: &[f64]) -> CsaResult<Vec<f64>> {
    let n = data.len();
    if n == 0 {
        return Err(CsaError::EmptySignal { context: "autocorrelation" });
    }

    let centered = center(data);
    Ok((0..n)
        .map(|lag| {
            centered[..n - lag]
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect())
}

/// Autocorrelation scaled so that lag 0 equals 1. A constant input has no
/// variance and is rejected.
pub fn normalized_autocorrelation(data: &[f64]) -> CsaResult<Vec<f64>> {
    let r = autocorrelation(data)?;
    let r0 = r[0];
    if r0 <= f64::EPSILON {
        return Err(CsaError::InvalidSignal {
            reason: "autocorrelation of a constant signal is undefined".to_string(),
        });
    }
    Ok(r.iter().map(|v| v / r0).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_matches_direct() {
        let data: Vec<f64> = (0..37).map(|i| ((i * 7) % 11) as f64 - 3.0).collect();
        let fast = autocorrelation(&data).unwrap();
        let slow = autocorrelation_direct(&data).unwrap();

        assert_eq!(fast.len(), data.len());
        for (a, b) in fast.iter().zip(&slow) {
            assert!((a - b).abs() < 1e-8, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_known_values() {
        // centred: [-1, 0, 1]
        let r = autocorrelation(&[1.0, 2.0, 3.0]).unwrap();
        assert!((r[0] - 2.0).abs() < 1e-12);
        assert!(r[1].abs() < 1e-12);
        assert!((r[2] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample() {
        assert_eq!(autocorrelation(&[5.0]).unwrap().len(), 1);
    }

    #[test]
    fn test_empty_and_constant() {
        assert!(autocorrelation(&[]).is_err());
        assert!(normalized_autocorrelation(&[2.0; 16]).is_err());
    }

    #[test]
    fn test_normalized_starts_at_one() {
        let data: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
        let r = normalized_autocorrelation(&data).unwrap();
        assert!((r[0] - 1.0).abs() < 1e-12);
        assert!(r.iter().all(|v| v.abs() <= 1.0 + 1e-9));
    }
}

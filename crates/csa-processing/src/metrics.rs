//! Error and similarity metrics between sampled series

use csa_core::{CsaError, CsaResult};
use serde::{Deserialize, Serialize};

fn check_lengths(a: &[f64], b: &[f64]) -> CsaResult<()> {
    if a.len() != b.len() {
        return Err(CsaError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(CsaError::EmptySignal { context: "metrics" });
    }
    Ok(())
}

/// `|a[i] - b[i]|` per sample
pub fn absolute_error(a: &[f64], b: &[f64]) -> CsaResult<Vec<f64>> {
    check_lengths(a, b)?;
    Ok(a.iter().zip(b).map(|(x, y)| (x - y).abs()).collect())
}

/// Summary of the deviation between an approximation and a reference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub max_abs: f64,
    pub rms: f64,
    pub final_abs: f64,
}

impl ErrorSummary {
    pub fn between(approx: &[f64], reference: &[f64]) -> CsaResult<Self> {
        let errors = absolute_error(approx, reference)?;
        let max_abs = errors.iter().fold(0.0_f64, |a, &b| a.max(b));
        let rms = (errors.iter().map(|e| e * e).sum::<f64>() / errors.len() as f64).sqrt();
        let final_abs = errors.last().copied().unwrap_or(0.0);
        Ok(ErrorSummary { max_abs, rms, final_abs })
    }
}

/// Pearson correlation coefficient
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> CsaResult<f64> {
    check_lengths(a, b)?;

    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Err(CsaError::InvalidSignal {
            reason: "correlation is undefined for a constant series".to_string(),
        });
    }

    Ok(cov / (var_a.sqrt() * var_b.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_summary() {
        let summary = ErrorSummary::between(&[1.0, 2.0, 4.0], &[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(summary.max_abs, 3.0);
        assert_eq!(summary.final_abs, 3.0);
        assert!((summary.rms - (10.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_signs() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let c = [4.0, 3.0, 2.0, 1.0];
        assert!((pearson_correlation(&a, &b).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson_correlation(&a, &c).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_correlation_errors() {
        assert!(matches!(
            pearson_correlation(&[1.0, 2.0], &[1.0]),
            Err(CsaError::LengthMismatch { left: 2, right: 1 })
        ));
        assert!(pearson_correlation(&[1.0, 1.0], &[1.0, 2.0]).is_err());
        assert!(pearson_correlation(&[], &[]).is_err());
    }
}

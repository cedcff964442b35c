//! RC network driven by a current step
//!
//! A current source `I` feeds a resistor `R` in parallel with a capacitor `C`.
//! The capacitor voltage obeys `dV/dt = (I - V/R) / C` and charges towards
//! `I * R` with time constant `tau = R * C`.

use csa_core::{CsaError, CsaResult, Signal};
use serde::{Deserialize, Serialize};

/// Parallel RC circuit with a step current source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcCircuit {
    /// Resistance in ohms
    pub resistance: f64,
    /// Capacitance in farads
    pub capacitance: f64,
    /// Step current in amperes
    pub current: f64,
}

impl RcCircuit {
    pub fn new(resistance: f64, capacitance: f64, current: f64) -> CsaResult<Self> {
        let circuit = RcCircuit { resistance, capacitance, current };
        circuit.validate()?;
        Ok(circuit)
    }

    pub fn validate(&self) -> CsaResult<()> {
        if !(self.resistance > 0.0) || !self.resistance.is_finite() {
            return Err(CsaError::ConfigurationError {
                message: format!("Resistance must be positive, got {}", self.resistance),
            });
        }
        if !(self.capacitance > 0.0) || !self.capacitance.is_finite() {
            return Err(CsaError::ConfigurationError {
                message: format!("Capacitance must be positive, got {}", self.capacitance),
            });
        }
        if !self.current.is_finite() {
            return Err(CsaError::ConfigurationError {
                message: "Current must be finite".to_string(),
            });
        }
        Ok(())
    }

    /// Time constant in seconds
    pub fn tau(&self) -> f64 {
        self.resistance * self.capacitance
    }

    /// Voltage the capacitor settles at
    pub fn steady_state(&self) -> f64 {
        self.current * self.resistance
    }

    /// dV/dt at capacitor voltage `v`
    pub fn derivative(&self, v: f64) -> f64 {
        (self.current - v / self.resistance) / self.capacitance
    }

    /// Coefficients `(a, b)` of the linear form `dV/dt = a*V + b`
    pub fn linear_coefficients(&self) -> (f64, f64) {
        (-1.0 / self.tau(), self.current / self.capacitance)
    }

    /// Closed-form capacitor voltage starting from 0 V
    pub fn exact_voltage(&self, t: f64) -> f64 {
        self.steady_state() * (1.0 - (-t / self.tau()).exp())
    }

    /// Exact response sampled at `i * dt` for `steps` samples
    pub fn exact_response(&self, dt: f64, steps: usize) -> CsaResult<Signal> {
        let samples = (0..steps).map(|i| self.exact_voltage(i as f64 * dt)).collect();
        Signal::new(samples, dt)
    }
}

impl Default for RcCircuit {
    /// 1 MOhm, 0.1 uF, 1 A step
    fn default() -> Self {
        RcCircuit {
            resistance: 1e6,
            capacitance: 0.1e-6,
            current: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_time_constant() {
        let rc = RcCircuit::default();
        assert!((rc.tau() - 0.1).abs() < 1e-12);
        assert_eq!(rc.steady_state(), 1e6);
    }

    #[test]
    fn test_exact_response() {
        let rc = RcCircuit::default();
        assert_eq!(rc.exact_voltage(0.0), 0.0);

        let one_tau = rc.exact_voltage(rc.tau());
        let expected = rc.steady_state() * (1.0 - (-1.0f64).exp());
        assert!((one_tau - expected).abs() < 1e-6);

        // Derivative vanishes at steady state
        assert!(rc.derivative(rc.steady_state()).abs() < 1e-9);
    }

    #[test]
    fn test_linear_form_matches_derivative() {
        let rc = RcCircuit::new(1e3, 1e-6, 2e-3).unwrap();
        let (a, b) = rc.linear_coefficients();
        for v in [0.0, 0.5, 1.0, 2.0] {
            assert!((a * v + b - rc.derivative(v)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rejects_non_physical() {
        assert!(RcCircuit::new(0.0, 1e-6, 1.0).is_err());
        assert!(RcCircuit::new(1e3, -1e-6, 1.0).is_err());
        assert!(RcCircuit::new(1e3, 1e-6, f64::INFINITY).is_err());
    }
}

//! Euler vs. trapezoidal integration of the RC step response

use crate::config::RcStudyConfig;
use crate::integrators::{solve_signal, IntegrationMethod};
use crate::metrics::{absolute_error, ErrorSummary};
use csa_core::{CsaResult, Signal};
use csa_simulation::RcCircuit;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Trajectory of one integration method against the exact response
#[derive(Debug, Clone)]
pub struct MethodRun {
    pub method: IntegrationMethod,
    pub voltage: Signal,
    /// Absolute error per sample
    pub error: Signal,
    pub summary: ErrorSummary,
}

/// Outcome of an RC study
#[derive(Debug, Clone)]
pub struct RcStudy {
    pub circuit: RcCircuit,
    pub dt: f64,
    pub exact: Signal,
    pub runs: Vec<MethodRun>,
}

impl RcStudy {
    pub fn run(&self, method: IntegrationMethod) -> Option<&MethodRun> {
        self.runs.iter().find(|r| r.method == method)
    }

    /// Scalar results suitable for printing or JSON output
    pub fn report(&self) -> RcReport {
        RcReport {
            tau: self.circuit.tau(),
            dt: self.dt,
            steps: self.exact.len(),
            methods: self.runs
                .iter()
                .map(|r| MethodReport {
                    method: r.method,
                    max_abs_error: r.summary.max_abs,
                    rms_error: r.summary.rms,
                    final_voltage: r.voltage.samples().last().copied().unwrap_or(0.0),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RcReport {
    pub tau: f64,
    pub dt: f64,
    pub steps: usize,
    pub methods: Vec<MethodReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodReport {
    pub method: IntegrationMethod,
    pub max_abs_error: f64,
    pub rms_error: f64,
    pub final_voltage: f64,
}

/// Integrate the RC circuit with every configured method from 0 V.
///
/// The exact solution is evaluated at the same instants `i * dt` as the
/// numerical trajectories.
pub fn run_rc_study(config: &RcStudyConfig) -> CsaResult<RcStudy> {
    config.validate()?;

    let circuit = config.circuit;
    let dt = config.dt();
    let steps = config.steps();
    let exact = circuit.exact_response(dt, steps)?;

    let mut runs = Vec::with_capacity(config.methods.len());
    for &method in &config.methods {
        let voltage = solve_signal(method, &circuit, 0.0, dt, steps)?;
        let error = Signal::new(absolute_error(voltage.samples(), exact.samples())?, dt)?;
        let summary = ErrorSummary::between(voltage.samples(), exact.samples())?;

        debug!(
            method = method.name(),
            max_abs = summary.max_abs,
            rms = summary.rms,
            "integrated RC response"
        );

        runs.push(MethodRun { method, voltage, error, summary });
    }

    info!(tau = circuit.tau(), dt, steps, "RC study complete");

    Ok(RcStudy { circuit, dt, exact, runs })
}

/// Maximum absolute error for `method` at each step size over a fixed span
/// of `time_constants` time constants.
pub fn convergence_study(
    circuit: &RcCircuit,
    method: IntegrationMethod,
    steps_per_tau: &[f64],
    time_constants: f64,
) -> CsaResult<Vec<(f64, f64)>> {
    steps_per_tau
        .iter()
        .map(|&per_tau| {
            let config = RcStudyConfig {
                circuit: *circuit,
                time_constants,
                steps_per_tau: per_tau,
                methods: vec![method],
            };
            let study = run_rc_study(&config)?;
            Ok((config.dt(), study.runs[0].summary.max_abs))
        })
        .collect()
}

/// Observed order of accuracy from successive (dt, error) pairs
pub fn observed_orders(errors: &[(f64, f64)]) -> Vec<f64> {
    errors
        .windows(2)
        .map(|w| {
            let (dt0, e0) = w[0];
            let (dt1, e1) = w[1];
            (e0 / e1).ln() / (dt0 / dt1).ln()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_study() {
        let study = run_rc_study(&RcStudyConfig::default()).unwrap();
        assert_eq!(study.exact.len(), 500);
        assert_eq!(study.runs.len(), 2);

        let euler = study.run(IntegrationMethod::ForwardEuler).unwrap();
        let trap = study.run(IntegrationMethod::Trapezoidal).unwrap();

        assert_eq!(euler.voltage.samples()[0], 0.0);
        assert!(trap.summary.max_abs < euler.summary.max_abs);

        // Errors are relative to a 1 MV steady state; both stay small
        let steady = study.circuit.steady_state();
        assert!(euler.summary.max_abs / steady < 0.01);
        assert!(trap.summary.max_abs / steady < 1e-4);
    }

    #[test]
    fn test_report_lists_methods() {
        let mut config = RcStudyConfig::default();
        config.methods.push(IntegrationMethod::ImplicitTrapezoidal);
        let report = run_rc_study(&config).unwrap().report();

        assert_eq!(report.steps, 500);
        assert_eq!(report.methods.len(), 3);
        assert_eq!(report.methods[2].method, IntegrationMethod::ImplicitTrapezoidal);
    }

    #[test]
    fn test_observed_orders() {
        let orders = observed_orders(&[(0.1, 1.0), (0.05, 0.25)]);
        assert!((orders[0] - 2.0).abs() < 1e-12);
    }
}

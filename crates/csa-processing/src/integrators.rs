//! Fixed-step integrators for first-order ODEs and sampled integrands
//!
//! ODE methods advance `dv/dt = f(t, v)` one step at a time:
//!
//! - forward Euler: `v + f(t, v)*dt`, local error O(dt^2)
//! - trapezoidal predictor-corrector: Euler predictor, then the average of the
//!   old and predicted slopes, local error O(dt^3)
//! - implicit trapezoidal: the exact trapezoid rule solved in closed form for
//!   linear systems `dv/dt = a*v + b`; stable for any step when `a < 0`

use csa_core::{CsaError, CsaResult, Signal};
use csa_simulation::RcCircuit;
use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Right-hand side of `dv/dt = f(t, v)`
pub trait FirstOrderOde<T: Float> {
    fn derivative(&self, t: T, v: T) -> T;

    /// `(a, b)` when the system is linear, `dv/dt = a*v + b`
    fn linear_coefficients(&self) -> Option<(T, T)> {
        None
    }
}

/// Adapter turning a closure into an ODE
pub struct FnOde<F>(pub F);

impl<T, F> FirstOrderOde<T> for FnOde<F>
where
    T: Float,
    F: Fn(T, T) -> T,
{
    fn derivative(&self, t: T, v: T) -> T {
        (self.0)(t, v)
    }
}

/// Linear time-invariant ODE `dv/dt = a*v + b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearOde<T> {
    pub a: T,
    pub b: T,
}

impl<T: Float> FirstOrderOde<T> for LinearOde<T> {
    fn derivative(&self, _t: T, v: T) -> T {
        self.a * v + self.b
    }

    fn linear_coefficients(&self) -> Option<(T, T)> {
        Some((self.a, self.b))
    }
}

impl FirstOrderOde<f64> for RcCircuit {
    fn derivative(&self, _t: f64, v: f64) -> f64 {
        RcCircuit::derivative(self, v)
    }

    fn linear_coefficients(&self) -> Option<(f64, f64)> {
        Some(RcCircuit::linear_coefficients(self))
    }
}

/// Integration schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationMethod {
    ForwardEuler,
    Trapezoidal,
    ImplicitTrapezoidal,
}

impl IntegrationMethod {
    pub fn name(&self) -> &'static str {
        match self {
            IntegrationMethod::ForwardEuler => "Euler",
            IntegrationMethod::Trapezoidal => "Trapezoidal",
            IntegrationMethod::ImplicitTrapezoidal => "Implicit trapezoidal",
        }
    }

    /// Global order of accuracy
    pub fn order(&self) -> u32 {
        match self {
            IntegrationMethod::ForwardEuler => 1,
            IntegrationMethod::Trapezoidal | IntegrationMethod::ImplicitTrapezoidal => 2,
        }
    }

    /// Advance `v` at time `t` by one step of size `dt`
    pub fn step<T, O>(&self, ode: &O, t: T, v: T, dt: T) -> CsaResult<T>
    where
        T: Float,
        O: FirstOrderOde<T> + ?Sized,
    {
        let two = T::one() + T::one();

        match self {
            IntegrationMethod::ForwardEuler => Ok(v + ode.derivative(t, v) * dt),

            IntegrationMethod::Trapezoidal => {
                let slope_prev = ode.derivative(t, v);
                let predicted = v + slope_prev * dt;
                let slope_new = ode.derivative(t + dt, predicted);
                Ok(v + (slope_prev + slope_new) * dt / two)
            }

            IntegrationMethod::ImplicitTrapezoidal => {
                let (a, b) = ode.linear_coefficients().ok_or_else(|| CsaError::IntegrationError {
                    reason: "implicit trapezoidal rule needs a linear ODE".to_string(),
                })?;
                let half = a * dt / two;
                let denom = T::one() - half;
                if denom == T::zero() {
                    return Err(CsaError::IntegrationError {
                        reason: "step size makes the implicit system singular".to_string(),
                    });
                }
                Ok((v * (T::one() + half) + b * dt) / denom)
            }
        }
    }
}

/// Integrate from `v0` for `steps` samples (the first sample is `v0`)
pub fn solve<T, O>(method: IntegrationMethod, ode: &O, v0: T, dt: T, steps: usize) -> CsaResult<Vec<T>>
where
    T: Float,
    O: FirstOrderOde<T> + ?Sized,
{
    if steps == 0 {
        return Err(CsaError::IntegrationError {
            reason: "at least one step is required".to_string(),
        });
    }
    if !(dt > T::zero()) {
        return Err(CsaError::IntegrationError {
            reason: "step size must be positive".to_string(),
        });
    }

    let mut values = Vec::with_capacity(steps);
    values.push(v0);

    let mut t = T::zero();
    let mut v = v0;
    for _ in 1..steps {
        v = method.step(ode, t, v, dt)?;
        t = t + dt;
        values.push(v);
    }

    Ok(values)
}

/// `solve` for f64 systems, packaged as a signal
pub fn solve_signal<O>(method: IntegrationMethod, ode: &O, v0: f64, dt: f64, steps: usize) -> CsaResult<Signal>
where
    O: FirstOrderOde<f64> + ?Sized,
{
    Signal::new(solve(method, ode, v0, dt, steps)?, dt)
}

/// Running integral of a sampled integrand, starting at 0.
///
/// Euler uses the left sample of each interval; both trapezoidal variants use
/// the interval average.
pub fn integrate_samples<T: Float>(method: IntegrationMethod, samples: &[T], dt: T) -> Vec<T> {
    let mut integral = Vec::with_capacity(samples.len());
    if samples.is_empty() {
        return integral;
    }

    let two = T::one() + T::one();
    let mut acc = T::zero();
    integral.push(acc);

    for w in samples.windows(2) {
        let area = match method {
            IntegrationMethod::ForwardEuler => w[0] * dt,
            IntegrationMethod::Trapezoidal | IntegrationMethod::ImplicitTrapezoidal => {
                (w[0] + w[1]) * dt / two
            }
        };
        acc = acc + area;
        integral.push(acc);
    }

    integral
}

/// Running integral of a signal
pub fn integrate_signal(method: IntegrationMethod, signal: &Signal) -> CsaResult<Signal> {
    if signal.is_empty() {
        return Err(CsaError::EmptySignal { context: "integrate_signal" });
    }
    let integral = integrate_samples(method, signal.samples(), signal.dt());
    Ok(Signal::new(integral, signal.dt())?.with_start(signal.start_time()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_euler_step() {
        let ode = FnOde(|_t: f64, v: f64| -v);
        let v = IntegrationMethod::ForwardEuler.step(&ode, 0.0, 1.0, 0.1).unwrap();
        assert!((v - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_trapezoidal_step() {
        let ode = FnOde(|_t: f64, v: f64| -v);
        // predictor 0.9, slopes -1 and -0.9 -> 1 - 0.095
        let v = IntegrationMethod::Trapezoidal.step(&ode, 0.0, 1.0, 0.1).unwrap();
        assert!((v - 0.905).abs() < 1e-12);
    }

    #[test]
    fn test_implicit_requires_linear() {
        let ode = FnOde(|_t: f64, v: f64| -v * v);
        assert!(matches!(
            IntegrationMethod::ImplicitTrapezoidal.step(&ode, 0.0, 1.0, 0.1),
            Err(CsaError::IntegrationError { .. })
        ));
    }

    #[test]
    fn test_implicit_stable_for_large_steps() {
        let ode = LinearOde { a: -1.0_f64, b: 0.0 };
        let values = solve(IntegrationMethod::ImplicitTrapezoidal, &ode, 1.0, 10.0, 50).unwrap();
        assert!(values.iter().all(|v| v.abs() <= 1.0));

        let euler = solve(IntegrationMethod::ForwardEuler, &ode, 1.0, 10.0, 50).unwrap();
        assert!(euler.last().unwrap().abs() > 1e6);
    }

    #[test]
    fn test_time_dependent_ode() {
        // dv/dt = t -> v = t^2 / 2, which the trapezoid rule integrates exactly
        let ode = FnOde(|t: f64, _v: f64| t);
        let values = solve(IntegrationMethod::Trapezoidal, &ode, 0.0, 0.01, 101).unwrap();
        assert!((values[100] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_solve_rejects_bad_input() {
        let ode = LinearOde { a: -1.0_f64, b: 0.0 };
        assert!(solve(IntegrationMethod::ForwardEuler, &ode, 1.0, 0.1, 0).is_err());
        assert!(solve(IntegrationMethod::ForwardEuler, &ode, 1.0, 0.0, 10).is_err());
    }

    #[test]
    fn test_generic_over_f32() {
        let ode = LinearOde { a: -1.0_f32, b: 1.0 };
        let values = solve(IntegrationMethod::Trapezoidal, &ode, 0.0_f32, 0.01, 1001).unwrap();
        let exact = 1.0 - (-10.0_f32).exp();
        assert!((values[1000] - exact).abs() < 1e-3);
    }

    #[test]
    fn test_integrate_samples() {
        let samples = [1.0, 3.0, 5.0];
        assert_eq!(
            integrate_samples(IntegrationMethod::ForwardEuler, &samples, 0.5),
            vec![0.0, 0.5, 2.0]
        );
        assert_eq!(
            integrate_samples(IntegrationMethod::Trapezoidal, &samples, 0.5),
            vec![0.0, 1.0, 3.0]
        );
        assert!(integrate_samples::<f64>(IntegrationMethod::Trapezoidal, &[], 0.5).is_empty());
    }

    #[test]
    fn test_integrate_empty_signal() {
        let signal = Signal::new(vec![], 1.0).unwrap();
        assert!(integrate_signal(IntegrationMethod::ForwardEuler, &signal).is_err());
    }
}

//! Audio recovery from an SPWM comparator output by numerical integration

use crate::config::SpwmStudyConfig;
use crate::integrators::{integrate_signal, integrate_samples, IntegrationMethod};
use crate::metrics::pearson_correlation;
use csa_core::{CsaError, CsaResult, Signal};
use csa_simulation::spwm::{self, SpwmSignals};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Running integral of the centred comparator output, normalised to peak 1
pub fn integrate_pwm(method: IntegrationMethod, pwm: &Signal, center_offset: f64) -> CsaResult<Signal> {
    let centered = pwm.map(|v| v - center_offset);
    Ok(integrate_signal(method, &centered)?.normalized_peak())
}

/// Centred sliding-window average computed from the running integral:
/// `(I[i+h] - I[i-h]) / (2h * dt)` with the window clamped at the edges.
///
/// A window of one carrier period removes the carrier and leaves the
/// modulating tone.
pub fn sliding_integral_average(
    method: IntegrationMethod,
    signal: &Signal,
    window: usize,
) -> CsaResult<Signal> {
    if signal.is_empty() {
        return Err(CsaError::EmptySignal { context: "sliding_integral_average" });
    }
    if window == 0 {
        return Err(CsaError::ConfigurationError {
            message: "window must be at least one sample".to_string(),
        });
    }

    let n = signal.len();
    let dt = signal.dt();
    let integral = integrate_samples(method, signal.samples(), dt);
    let half = (window / 2).max(1);

    let averaged = (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            if hi == lo {
                signal.samples()[i]
            } else {
                (integral[hi] - integral[lo]) / ((hi - lo) as f64 * dt)
            }
        })
        .collect();

    Ok(Signal::new(averaged, dt)?.with_start(signal.start_time()))
}

/// Everything produced by one SPWM synthesis and reconstruction run
#[derive(Debug, Clone)]
pub struct SpwmStudy {
    pub signals: SpwmSignals,
    /// Normalised running integral, Euler rule
    pub integrated_euler: Signal,
    /// Normalised running integral, trapezoid rule
    pub integrated_trapezoidal: Signal,
    /// Normalised tone recovered with a one-carrier-period window
    pub recovered: Signal,
    pub report: SpwmReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpwmReport {
    pub samples: usize,
    pub duty_cycle: f64,
    pub recovery_window: usize,
    /// Correlation of the recovered tone with the audio sine
    pub recovered_correlation: f64,
    /// Correlation of the trapezoidal running integral with the integral of the audio
    pub integral_correlation: f64,
    /// Largest difference between the Euler and trapezoidal integrals
    pub euler_trapezoidal_gap: f64,
}

pub fn run_spwm_study(config: &SpwmStudyConfig) -> CsaResult<SpwmStudy> {
    config.validate()?;

    let signals = spwm::generate(&config.signal)?;
    let window = config.window();

    let integrated_euler = integrate_pwm(IntegrationMethod::ForwardEuler, &signals.spwm, config.center_offset)?;
    let integrated_trapezoidal = integrate_pwm(IntegrationMethod::Trapezoidal, &signals.spwm, config.center_offset)?;

    let centered = signals.spwm.map(|v| v - config.center_offset);
    let recovered = sliding_integral_average(IntegrationMethod::Trapezoidal, &centered, window)?
        .normalized_peak();

    let recovered_correlation = pearson_correlation(recovered.samples(), signals.audio.samples())?;

    let audio_integral = integrate_signal(IntegrationMethod::Trapezoidal, &signals.audio)?.normalized_peak();
    let integral_correlation =
        pearson_correlation(integrated_trapezoidal.samples(), audio_integral.samples())?;

    let euler_trapezoidal_gap = integrated_euler.samples()
        .iter()
        .zip(integrated_trapezoidal.samples())
        .fold(0.0_f64, |acc, (a, b)| acc.max((a - b).abs()));

    if recovered_correlation < 0.9 {
        warn!(recovered_correlation, window, "recovered tone tracks the audio poorly");
    }
    info!(recovered_correlation, integral_correlation, "SPWM study complete");

    let report = SpwmReport {
        samples: signals.spwm.len(),
        duty_cycle: signals.spwm.stats().mean,
        recovery_window: window,
        recovered_correlation,
        integral_correlation,
        euler_trapezoidal_gap,
    };

    Ok(SpwmStudy {
        signals,
        integrated_euler,
        integrated_trapezoidal,
        recovered,
        report,
    })
}

//! CSA-Processing: numeric methods and analysis pipelines
//!
//! Integrators, spectra, autocorrelation-based period estimation and the
//! four lab studies built on them.

pub mod autocorrelation;
pub mod config;
pub mod integrators;
pub mod metrics;
pub mod peaks;
pub mod period;
pub mod rc_study;
pub mod reconstruction;
pub mod spectrum;

pub use autocorrelation::{autocorrelation, normalized_autocorrelation};
pub use config::{LabConfig, RcStudyConfig, SensorConfig, SpectrumConfig, SpwmStudyConfig};
pub use integrators::{
    integrate_samples, integrate_signal, solve, solve_signal, FirstOrderOde, FnOde,
    IntegrationMethod, LinearOde,
};
pub use metrics::{pearson_correlation, ErrorSummary};
pub use peaks::find_peaks;
pub use period::{frequency_from_period, PeriodEstimate, PeriodEstimator};
pub use rc_study::{run_rc_study, MethodRun, RcReport, RcStudy};
pub use reconstruction::{run_spwm_study, SpwmReport, SpwmStudy};
pub use spectrum::{SimulatorSpectrum, SpectralPeak, Spectrum, SpectrumAnalyzer};

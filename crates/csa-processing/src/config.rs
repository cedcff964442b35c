//! Configuration management for the analysis pipelines

use crate::integrators::IntegrationMethod;
use crate::period::{PeriodEstimator, DEFAULT_PEAK_DISTANCE, DEFAULT_SAMPLE_INTERVAL};
use csa_core::{CsaError, CsaResult};
use csa_simulation::{RcCircuit, SensorSimConfig, SpwmConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest RC study grid, in samples
pub const MAX_RC_STEPS: usize = 10_000_000;

/// Configuration for every pipeline, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Configuration name/profile
    pub name: String,
    pub rc: RcStudyConfig,
    pub spectrum: SpectrumConfig,
    pub spwm: SpwmStudyConfig,
    pub sensor: SensorConfig,
}

/// RC integration study parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcStudyConfig {
    pub circuit: RcCircuit,
    /// Simulated span in time constants
    pub time_constants: f64,
    /// Steps per time constant (dt = tau / steps_per_tau)
    pub steps_per_tau: f64,
    /// Methods compared against the exact solution
    pub methods: Vec<IntegrationMethod>,
}

/// Simulator output columns and spectrum view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    pub time_column: usize,
    pub pwm_column: usize,
    pub output_column: usize,
    /// Upper frequency shown in spectrum views, Hz
    pub max_frequency: f64,
}

/// SPWM synthesis and reconstruction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpwmStudyConfig {
    pub signal: SpwmConfig,
    /// Level subtracted from the comparator output before integration
    pub center_offset: f64,
    /// Sliding integration window for audio recovery; one carrier period when unset
    pub recovery_window: Option<usize>,
}

/// Serial sensor acquisition and period estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Serial device path
    pub port: String,
    pub baud_rate: u32,
    /// Samples to collect before analysis
    pub sample_count: usize,
    /// Time between samples in seconds
    pub sample_interval: f64,
    /// Give up when the samples have not arrived within this many seconds
    pub timeout_secs: f64,
    /// Minimum spacing between autocorrelation peaks, in lags
    pub peak_distance: usize,
    /// Simulated sensor used instead of a port when requested
    pub simulation: SensorSimConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            name: "Default lab".to_string(),
            rc: RcStudyConfig::default(),
            spectrum: SpectrumConfig::default(),
            spwm: SpwmStudyConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl Default for RcStudyConfig {
    fn default() -> Self {
        Self {
            circuit: RcCircuit::default(),
            time_constants: 5.0,
            steps_per_tau: 100.0,
            methods: vec![IntegrationMethod::ForwardEuler, IntegrationMethod::Trapezoidal],
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            time_column: 0,
            pwm_column: 7,
            output_column: 9,
            max_frequency: 10_000.0,
        }
    }
}

impl Default for SpwmStudyConfig {
    fn default() -> Self {
        Self {
            signal: SpwmConfig::default(),
            center_offset: 0.5,
            recovery_window: None,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        let port = if cfg!(windows) { "COM6" } else { "/dev/ttyACM0" };
        Self {
            port: port.to_string(),
            baud_rate: 9600,
            sample_count: 100,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            timeout_secs: 30.0,
            peak_distance: DEFAULT_PEAK_DISTANCE,
            simulation: SensorSimConfig::default(),
        }
    }
}

impl RcStudyConfig {
    /// Integration step in seconds
    pub fn dt(&self) -> f64 {
        self.circuit.tau() / self.steps_per_tau
    }

    /// Number of samples including the initial condition
    pub fn steps(&self) -> usize {
        (self.time_constants * self.steps_per_tau).round() as usize
    }

    pub fn validate(&self) -> CsaResult<()> {
        self.circuit.validate()?;
        if !(self.time_constants > 0.0) || !self.time_constants.is_finite() {
            return Err(CsaError::ConfigurationError {
                message: format!("RC study span must be positive and finite, got {}", self.time_constants),
            });
        }
        if !(self.steps_per_tau >= 1.0) || !self.steps_per_tau.is_finite() {
            return Err(CsaError::ConfigurationError {
                message: format!("RC study needs a finite number of steps per time constant, got {}", self.steps_per_tau),
            });
        }
        let samples = (self.time_constants * self.steps_per_tau).round();
        if samples > MAX_RC_STEPS as f64 {
            return Err(CsaError::ConfigurationError {
                message: format!("RC study grid of {} samples exceeds {}", samples, MAX_RC_STEPS),
            });
        }
        if self.steps() < 2 {
            return Err(CsaError::ConfigurationError {
                message: "RC study needs at least two samples".to_string(),
            });
        }
        if self.methods.is_empty() {
            return Err(CsaError::ConfigurationError {
                message: "RC study needs at least one integration method".to_string(),
            });
        }
        Ok(())
    }
}

impl SpectrumConfig {
    pub fn validate(&self) -> CsaResult<()> {
        if !(self.max_frequency > 0.0) {
            return Err(CsaError::ConfigurationError {
                message: "Spectrum view must extend above 0 Hz".to_string(),
            });
        }
        if self.pwm_column == self.time_column || self.output_column == self.time_column {
            return Err(CsaError::ConfigurationError {
                message: "Signal columns must differ from the time column".to_string(),
            });
        }
        Ok(())
    }
}

impl SpwmStudyConfig {
    pub fn validate(&self) -> CsaResult<()> {
        self.signal.validate()?;
        if self.recovery_window == Some(0) {
            return Err(CsaError::ConfigurationError {
                message: "Recovery window must be at least one sample".to_string(),
            });
        }
        Ok(())
    }

    pub fn window(&self) -> usize {
        self.recovery_window
            .unwrap_or_else(|| self.signal.samples_per_carrier_period())
    }
}

impl SensorConfig {
    pub fn validate(&self) -> CsaResult<()> {
        if self.port.is_empty() {
            return Err(CsaError::ConfigurationError {
                message: "Serial port cannot be empty".to_string(),
            });
        }
        if self.baud_rate == 0 {
            return Err(CsaError::ConfigurationError {
                message: "Baud rate must be greater than 0".to_string(),
            });
        }
        if self.sample_count < 3 {
            return Err(CsaError::ConfigurationError {
                message: "At least three samples are needed to estimate a period".to_string(),
            });
        }
        self.timeout()?;
        PeriodEstimator::new(self.peak_distance, self.sample_interval)?;
        Ok(())
    }

    /// Acquisition deadline as a `Duration`
    pub fn timeout(&self) -> CsaResult<Duration> {
        if !(self.timeout_secs > 0.0) {
            return Err(CsaError::ConfigurationError {
                message: "Acquisition timeout must be positive".to_string(),
            });
        }
        Duration::try_from_secs_f64(self.timeout_secs).map_err(|e| CsaError::ConfigurationError {
            message: format!("Acquisition timeout {} s is out of range: {}", self.timeout_secs, e),
        })
    }

    pub fn estimator(&self) -> CsaResult<PeriodEstimator> {
        PeriodEstimator::new(self.peak_distance, self.sample_interval)
    }
}

impl LabConfig {
    pub fn validate(&self) -> CsaResult<()> {
        self.rc.validate()?;
        self.spectrum.validate()?;
        self.spwm.validate()?;
        self.sensor.validate()?;
        Ok(())
    }

    pub fn to_json(&self) -> CsaResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CsaError::ConfigurationError {
            message: format!("Failed to serialize configuration: {}", e),
        })
    }

    pub fn from_json(json: &str) -> CsaResult<Self> {
        serde_json::from_str(json).map_err(|e| CsaError::ConfigurationError {
            message: format!("Failed to deserialize configuration: {}", e),
        })
    }

    /// Load and validate a JSON configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CsaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CsaError::IoError {
            message: format!("{}: {}", path.display(), e),
        })?;
        let config = Self::from_json(&text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LabConfig::default();
        assert!(config.validate().is_ok());

        assert_eq!(config.rc.steps(), 500);
        assert!((config.rc.dt() - 1e-3).abs() < 1e-15);
        assert_eq!(config.spwm.window(), 11);
        assert_eq!(config.spectrum.pwm_column, 7);
        assert_eq!(config.sensor.baud_rate, 9600);
    }

    #[test]
    fn test_json_serialization() {
        let mut config = LabConfig::default();
        config.name = "bench".to_string();
        config.rc.methods.push(IntegrationMethod::ImplicitTrapezoidal);

        let json = config.to_json().unwrap();
        assert!(json.contains("implicit_trapezoidal"));

        let deserialized = LabConfig::from_json(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = LabConfig::from_json(r#"{ "sensor": { "port": "/dev/ttyUSB1" } }"#).unwrap();
        assert_eq!(config.sensor.port, "/dev/ttyUSB1");
        assert_eq!(config.sensor.sample_count, 100);
        assert_eq!(config.spectrum, SpectrumConfig::default());
    }

    #[test]
    fn test_config_validation() {
        let mut config = LabConfig::default();
        config.rc.steps_per_tau = 0.0;
        assert!(config.validate().is_err());

        let mut config = LabConfig::default();
        config.sensor.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = LabConfig::default();
        config.sensor.sample_interval = 0.0;
        assert!(config.validate().is_err());

        let mut config = LabConfig::default();
        config.spectrum.pwm_column = 0;
        assert!(config.validate().is_err());

        let mut config = LabConfig::default();
        config.spwm.recovery_window = Some(0);
        assert!(config.validate().is_err());

        let mut config = LabConfig::default();
        config.rc.methods.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unbounded_rc_grid_is_rejected() {
        let mut config = RcStudyConfig::default();
        config.steps_per_tau = f64::INFINITY;
        assert!(matches!(config.validate(), Err(CsaError::ConfigurationError { .. })));

        let mut config = RcStudyConfig::default();
        config.time_constants = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = RcStudyConfig::default();
        config.time_constants = 1e12;
        assert!(config.validate().is_err());

        let mut config = RcStudyConfig::default();
        config.steps_per_tau = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sensor_timeout_range() {
        let config = SensorConfig::default();
        assert_eq!(config.timeout().unwrap(), Duration::from_secs(30));

        for bad in [1e30, f64::INFINITY, f64::NAN, 0.0, -1.0] {
            let mut config = SensorConfig::default();
            config.timeout_secs = bad;
            assert!(matches!(config.validate(), Err(CsaError::ConfigurationError { .. })), "{}", bad);
            assert!(config.timeout().is_err());
        }
    }

    #[test]
    fn test_partial_nested_json() {
        let config = LabConfig::from_json(
            r#"{ "spwm": { "signal": { "carrier": "sawtooth" } }, "sensor": { "simulation": { "seed": 7 } } }"#,
        )
        .unwrap();
        assert_eq!(config.spwm.signal.carrier, csa_simulation::CarrierKind::Sawtooth);
        assert_eq!(config.spwm.signal.carrier_frequency, 44_000.0);
        assert_eq!(config.sensor.simulation.seed, Some(7));
        assert_eq!(config.sensor.simulation.frequency, 10.0);
        assert_eq!(config.rc.circuit, RcCircuit::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            LabConfig::from_json("{ not json"),
            Err(CsaError::ConfigurationError { .. })
        ));
    }
}

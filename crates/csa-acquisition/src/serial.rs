//! Serial port source

use crate::collector::{Collection, SampleCollector, SensorEvent};
use csa_core::{config_error, CsaError, CsaResult};
use serde::{Deserialize, Serialize};
use serialport::SerialPort;
use std::io::BufReader;
use std::time::Duration;
use tracing::{info, warn};

/// Serial link parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0` or `COM6`
    pub port: String,
    pub baud_rate: u32,
    /// Valid readings to collect
    pub sample_count: usize,
    /// Per-read timeout of the port
    pub read_timeout: Duration,
    /// Upper bound on the whole collection
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let port = if cfg!(windows) { "COM6" } else { "/dev/ttyACM0" };
        Self {
            port: port.to_string(),
            baud_rate: 9600,
            sample_count: 100,
            read_timeout: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
        }
    }
}

impl SerialConfig {
    pub fn validate(&self) -> CsaResult<()> {
        if self.port.is_empty() {
            return Err(config_error!("Serial port cannot be empty"));
        }
        if self.baud_rate == 0 {
            return Err(config_error!("Baud rate must be greater than 0"));
        }
        if self.read_timeout.is_zero() {
            return Err(config_error!("Read timeout must be positive"));
        }
        Ok(())
    }

    pub fn collector(&self) -> CsaResult<SampleCollector> {
        SampleCollector::new(self.sample_count, self.timeout)
    }
}

/// Names of the serial ports present on this machine
pub fn available_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!(error = %e, "could not enumerate serial ports");
            Vec::new()
        }
    }
}

pub fn open_port(config: &SerialConfig) -> CsaResult<Box<dyn SerialPort>> {
    config.validate()?;
    serialport::new(config.port.as_str(), config.baud_rate)
        .timeout(config.read_timeout)
        .open()
        .map_err(|e| {
            let ports = available_ports();
            CsaError::AcquisitionError {
                reason: if ports.is_empty() {
                    format!("cannot open {}: {}", config.port, e)
                } else {
                    format!("cannot open {}: {} (available: {})", config.port, e, ports.join(", "))
                },
            }
        })
}

/// Open the port and block until the configured number of readings arrive
pub fn read_serial_samples(config: &SerialConfig) -> CsaResult<Collection> {
    read_serial_samples_with(config, config.collector()?, |_| {})
}

pub(crate) fn read_serial_samples_with<F>(
    config: &SerialConfig,
    collector: SampleCollector,
    on_event: F,
) -> CsaResult<Collection>
where
    F: FnMut(SensorEvent),
{
    let port = open_port(config)?;
    info!(port = %config.port, baud = config.baud_rate, samples = collector.target(), "reading serial sensor");

    let mut reader = BufReader::new(port);
    collector.collect_with(&mut reader, on_event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SerialConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.sample_count, 100);
        assert_eq!(config.timeout, Duration::from_secs(30));
        if cfg!(windows) {
            assert_eq!(config.port, "COM6");
        } else {
            assert_eq!(config.port, "/dev/ttyACM0");
        }
    }

    #[test]
    fn test_validation() {
        let mut config = SerialConfig::default();
        config.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = SerialConfig::default();
        config.port.clear();
        assert!(config.validate().is_err());

        let mut config = SerialConfig::default();
        config.sample_count = 0;
        assert!(config.collector().is_err());
    }

    #[test]
    fn test_missing_port_is_acquisition_error() {
        let config = SerialConfig {
            port: "/dev/csa-no-such-port".to_string(),
            ..SerialConfig::default()
        };
        assert!(matches!(
            open_port(&config),
            Err(CsaError::AcquisitionError { .. })
        ));
    }
}

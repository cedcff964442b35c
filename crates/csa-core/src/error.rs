//! Error handling for the CSA workspace
//!
//! One error type shared by every analysis pipeline so that loaders,
//! integrators and estimators can be chained with `?`.

use core::fmt;

/// Result type alias for CSA operations
pub type CsaResult<T> = Result<T, CsaError>;

/// Error type for all CSA operations
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CsaError {
    /// Signal construction or shape is invalid
    InvalidSignal {
        /// Description of the problem
        reason: String,
    },

    /// An operation received a signal with no samples
    EmptySignal {
        /// Operation that required samples
        context: &'static str,
    },

    /// Fewer samples than an operation needs
    InsufficientSamples {
        /// Operation that required samples
        context: &'static str,
        /// Samples required
        required: usize,
        /// Samples available
        available: usize,
    },

    /// Data file line could not be parsed
    ParseError {
        /// 1-based line number in the source
        line: usize,
        /// Description of the parse failure
        reason: String,
    },

    /// Requested column does not exist in a data table
    ColumnOutOfRange {
        /// Requested column index
        column: usize,
        /// Number of columns available
        available: usize,
    },

    /// Configuration value rejected by validation
    ConfigurationError {
        /// Description of the invalid value
        message: String,
    },

    /// Integrator could not be applied
    IntegrationError {
        /// Description of the failure
        reason: String,
    },

    /// Autocorrelation has no peak at a non-zero lag
    PeriodNotFound,

    /// Two series that must align have different lengths
    LengthMismatch {
        /// Length of the left-hand series
        left: usize,
        /// Length of the right-hand series
        right: usize,
    },

    /// Sample acquisition failed
    AcquisitionError {
        /// Description of the failure
        reason: String,
    },

    /// Acquisition deadline elapsed before enough samples arrived
    Timeout {
        /// Samples collected before the deadline
        collected: usize,
        /// Samples requested
        requested: usize,
    },

    /// Underlying I/O failure
    IoError {
        /// I/O error description
        message: String,
    },
}

impl fmt::Display for CsaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsaError::InvalidSignal { reason } => {
                write!(f, "Invalid signal: {}", reason)
            }
            CsaError::EmptySignal { context } => {
                write!(f, "Empty signal passed to {}", context)
            }
            CsaError::InsufficientSamples { context, required, available } => {
                write!(f, "Insufficient samples for {}: required {}, available {}",
                       context, required, available)
            }
            CsaError::ParseError { line, reason } => {
                write!(f, "Parse error on line {}: {}", line, reason)
            }
            CsaError::ColumnOutOfRange { column, available } => {
                write!(f, "Column {} out of range: table has {} columns",
                       column, available)
            }
            CsaError::ConfigurationError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            CsaError::IntegrationError { reason } => {
                write!(f, "Integration error: {}", reason)
            }
            CsaError::PeriodNotFound => {
                write!(f, "No clear period detected")
            }
            CsaError::LengthMismatch { left, right } => {
                write!(f, "Length mismatch: {} vs {} samples", left, right)
            }
            CsaError::AcquisitionError { reason } => {
                write!(f, "Acquisition error: {}", reason)
            }
            CsaError::Timeout { collected, requested } => {
                write!(f, "Acquisition timed out after {} of {} samples",
                       collected, requested)
            }
            CsaError::IoError { message } => {
                write!(f, "I/O error: {}", message)
            }
        }
    }
}

impl std::error::Error for CsaError {}

impl From<std::io::Error> for CsaError {
    fn from(err: std::io::Error) -> Self {
        CsaError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::error::CsaError::ConfigurationError {
            message: format!($($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CsaError::Timeout {
            collected: 42,
            requested: 100,
        };
        let display = format!("{}", error);
        assert!(display.contains("timed out"));
        assert!(display.contains("42"));
        assert!(display.contains("100"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.dat");
        let error: CsaError = io.into();
        assert!(matches!(error, CsaError::IoError { .. }));
        assert!(error.to_string().contains("missing.dat"));
    }

    #[test]
    fn test_config_error_macro() {
        let error = config_error!("dt must be positive, got {}", -1.0);
        assert_eq!(
            error,
            CsaError::ConfigurationError {
                message: "dt must be positive, got -1".to_string()
            }
        );
    }
}

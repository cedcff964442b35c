//! Whitespace-delimited numeric tables, as written by circuit simulators
//!
//! Each non-empty line is one row; every row must have the same number of
//! columns. Lines starting with `#` are comments.

use crate::error::{CsaError, CsaResult};
use crate::signal::Signal;
use std::path::Path;
use tracing::debug;

/// Column-major numeric table
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<Vec<f64>>,
}

impl DataTable {
    /// Parse table text
    pub fn parse(text: &str) -> CsaResult<Self> {
        let mut columns: Vec<Vec<f64>> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut row = Vec::with_capacity(columns.len());
            for field in line.split_whitespace() {
                let value = field.parse::<f64>().map_err(|e| CsaError::ParseError {
                    line: idx + 1,
                    reason: format!("'{}': {}", field, e),
                })?;
                row.push(value);
            }

            if columns.is_empty() {
                columns = vec![Vec::new(); row.len()];
            } else if row.len() != columns.len() {
                return Err(CsaError::ParseError {
                    line: idx + 1,
                    reason: format!("expected {} columns, found {}", columns.len(), row.len()),
                });
            }

            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
        }

        debug!(
            columns = columns.len(),
            rows = columns.first().map_or(0, Vec::len),
            "parsed data table"
        );

        Ok(DataTable { columns })
    }

    /// Read and parse a table file
    pub fn from_file<P: AsRef<Path>>(path: P) -> CsaResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CsaError::IoError {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::parse(&text)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn column(&self, index: usize) -> CsaResult<&[f64]> {
        self.columns
            .get(index)
            .map(Vec::as_slice)
            .ok_or(CsaError::ColumnOutOfRange {
                column: index,
                available: self.columns.len(),
            })
    }

    /// Build a signal from a value column, taking the step from the first two
    /// entries of the time column.
    pub fn signal(&self, time_column: usize, value_column: usize) -> CsaResult<Signal> {
        let time = self.column(time_column)?;
        let values = self.column(value_column)?;

        if time.len() < 2 {
            return Err(CsaError::InsufficientSamples {
                context: "data table time base",
                required: 2,
                available: time.len(),
            });
        }

        let dt = time[1] - time[0];
        if dt <= 0.0 {
            return Err(CsaError::InvalidSignal {
                reason: format!("time column {} is not increasing (dt = {})", time_column, dt),
            });
        }

        Ok(Signal::new(values.to_vec(), dt)?.with_start(time[0]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# t v
0.0   1.0  10.0
1e-3  2.0  20.0

2e-3  3.0  30.0
";

    #[test]
    fn test_parse_columns() {
        let table = DataTable::parse(SAMPLE).unwrap();
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column(2).unwrap(), &[10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_signal_from_columns() {
        let table = DataTable::parse(SAMPLE).unwrap();
        let signal = table.signal(0, 1).unwrap();
        assert!((signal.dt() - 1e-3).abs() < 1e-15);
        assert_eq!(signal.samples(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_column_out_of_range() {
        let table = DataTable::parse(SAMPLE).unwrap();
        assert_eq!(
            table.signal(0, 9).unwrap_err(),
            CsaError::ColumnOutOfRange { column: 9, available: 3 }
        );
    }

    #[test]
    fn test_ragged_row_names_line() {
        let err = DataTable::parse("0 1\n1 2 3\n").unwrap_err();
        assert!(matches!(err, CsaError::ParseError { line: 2, .. }));
    }

    #[test]
    fn test_bad_number_names_line() {
        let err = DataTable::parse("0 1\n1 x\n").unwrap_err();
        match err {
            CsaError::ParseError { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("'x'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_single_row_has_no_time_base() {
        let table = DataTable::parse("0 1\n").unwrap();
        assert!(matches!(
            table.signal(0, 1),
            Err(CsaError::InsufficientSamples { available: 1, .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = DataTable::from_file("/nonexistent/ngspice_output.dat").unwrap_err();
        assert!(matches!(err, CsaError::IoError { .. }));
    }
}

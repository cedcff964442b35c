//! CSA-Core: Foundation types for circuit signal analysis
//!
//! Uniformly sampled signals, simulator data tables and the shared error type.

pub mod error;
pub mod signal;
pub mod table;

pub use error::{CsaError, CsaResult};
pub use signal::*;
pub use table::DataTable;

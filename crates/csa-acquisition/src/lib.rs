//! CSA-Acquisition: sensor readings over a serial link
//!
//! Integer-per-line decoding, bounded blocking collection and an async
//! stream wrapper running the reader on tokio's blocking pool.

pub mod collector;
pub mod parser;
pub mod serial;
pub mod stream;

pub use collector::{Collection, SampleCollector, SensorEvent};
pub use parser::parse_sample_line;
pub use serial::{available_ports, open_port, read_serial_samples, SerialConfig};
pub use stream::{collect_samples, spawn_reader, spawn_serial, SensorStream};

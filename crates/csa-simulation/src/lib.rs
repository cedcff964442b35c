//! CSA-Simulation: circuit models and signal generators
//!
//! Analytic waveforms, the RC step-response model, SPWM synthesis and a
//! simulated serial sensor.

pub mod rc_circuit;
pub mod sensor_simulator;
pub mod spwm;
pub mod waveforms;

pub use rc_circuit::RcCircuit;
pub use sensor_simulator::*;
pub use spwm::{CarrierKind, SpwmConfig, SpwmSignals};
pub use waveforms::*;

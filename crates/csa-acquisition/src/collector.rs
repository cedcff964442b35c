//! Bounded sample collection from a line-oriented byte stream

use crate::parser::{decode_line, parse_sample_line};
use csa_core::{config_error, CsaError, CsaResult};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Something observed while reading the link
#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    /// A valid reading; `index` counts valid readings from 0
    Sample { index: usize, value: i64 },
    /// A line that did not parse as an integer
    Skipped { line: String },
}

/// Readings gathered by a completed collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub samples: Vec<i64>,
    pub skipped: usize,
}

/// Reads integer lines until a target count, end of input, or a deadline
#[derive(Debug, Clone)]
pub struct SampleCollector {
    target: usize,
    timeout: Duration,
    stop: Option<Arc<AtomicBool>>,
}

impl SampleCollector {
    pub fn new(target: usize, timeout: Duration) -> CsaResult<Self> {
        if target == 0 {
            return Err(config_error!("Sample target must be greater than 0"));
        }
        if timeout.is_zero() {
            return Err(config_error!("Acquisition timeout must be positive"));
        }
        Ok(Self { target, timeout, stop: None })
    }

    /// Abort with an error as soon as `flag` becomes true
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn collect<R: BufRead>(&self, reader: &mut R) -> CsaResult<Collection> {
        self.collect_with(reader, |_| {})
    }

    /// Collect readings, reporting every accepted or skipped line to `on_event`.
    ///
    /// `TimedOut` and `WouldBlock` from the reader mean no data yet; bytes of
    /// a partially received line are kept until its newline arrives.
    pub fn collect_with<R, F>(&self, reader: &mut R, mut on_event: F) -> CsaResult<Collection>
    where
        R: BufRead,
        F: FnMut(SensorEvent),
    {
        // A timeout too large for `Instant` never expires
        let deadline = Instant::now().checked_add(self.timeout);
        let mut samples = Vec::with_capacity(self.target);
        let mut skipped = 0;
        let mut buf = Vec::new();

        while samples.len() < self.target {
            if self.is_stopped() {
                return Err(CsaError::AcquisitionError {
                    reason: format!("collection cancelled after {} samples", samples.len()),
                });
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                warn!(collected = samples.len(), requested = self.target, "acquisition timed out");
                return Err(CsaError::Timeout {
                    collected: samples.len(),
                    requested: self.target,
                });
            }

            match reader.read_until(b'\n', &mut buf) {
                Ok(0) if buf.is_empty() => {
                    return Err(CsaError::AcquisitionError {
                        reason: format!(
                            "input ended after {} of {} samples",
                            samples.len(),
                            self.target
                        ),
                    });
                }
                Ok(_) => {
                    let line = decode_line(&buf);
                    buf.clear();
                    match parse_sample_line(&line) {
                        Some(value) => {
                            on_event(SensorEvent::Sample { index: samples.len(), value });
                            samples.push(value);
                        }
                        None => {
                            skipped += 1;
                            let line = line.trim().to_string();
                            debug!(line = %line, "skipping malformed line");
                            on_event(SensorEvent::Skipped { line });
                        }
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!(collected = samples.len(), skipped, "collection complete");
        Ok(Collection { samples, skipped })
    }

    fn is_stopped(&self) -> bool {
        self.stop
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

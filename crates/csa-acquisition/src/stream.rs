//! Async sensor streaming on top of the blocking collector

use crate::collector::{Collection, SampleCollector, SensorEvent};
use crate::serial::{read_serial_samples_with, SerialConfig};
use csa_core::{CsaError, CsaResult};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

const EVENT_BUFFER: usize = 256;

/// Live view of a collection running on the blocking thread pool
pub struct SensorStream {
    events: mpsc::Receiver<SensorEvent>,
    task: Option<JoinHandle<CsaResult<Collection>>>,
    stop: Arc<AtomicBool>,
    requested: usize,
}

impl SensorStream {
    fn spawn<F>(requested: usize, stop: Arc<AtomicBool>, job: F) -> Self
    where
        F: FnOnce(mpsc::Sender<SensorEvent>) -> CsaResult<Collection> + Send + 'static,
    {
        let (sender, events) = mpsc::channel(EVENT_BUFFER);
        let task = tokio::task::spawn_blocking(move || job(sender));
        Self { events, task: Some(task), stop, requested }
    }

    /// Next event, or `None` once the reader has finished
    pub async fn recv(&mut self) -> Option<SensorEvent> {
        self.events.recv().await
    }

    /// Ask the reader to give up at its next line
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    /// Drain remaining events and return the reader's result
    pub async fn finish(mut self) -> CsaResult<Collection> {
        while self.events.recv().await.is_some() {}
        self.join().await
    }

    async fn join(&mut self) -> CsaResult<Collection> {
        match self.task.take() {
            Some(task) => task.await.map_err(|e| CsaError::AcquisitionError {
                reason: format!("sensor reader task failed: {}", e),
            })?,
            None => Err(CsaError::AcquisitionError {
                reason: "sensor reader already joined".to_string(),
            }),
        }
    }
}

impl Drop for SensorStream {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Stream readings from any line source, e.g. a simulated sensor
pub fn spawn_reader<R>(mut reader: R, collector: SampleCollector) -> SensorStream
where
    R: BufRead + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let requested = collector.target();
    let collector = collector.with_stop_flag(stop.clone());

    SensorStream::spawn(requested, stop, move |sender| {
        collector.collect_with(&mut reader, |event| {
            // A closed channel only means nobody is watching
            let _ = sender.blocking_send(event);
        })
    })
}

/// Stream readings from a serial port
pub fn spawn_serial(config: SerialConfig) -> CsaResult<SensorStream> {
    config.validate()?;
    let stop = Arc::new(AtomicBool::new(false));
    let requested = config.sample_count;
    let collector = config.collector()?.with_stop_flag(stop.clone());

    Ok(SensorStream::spawn(requested, stop, move |sender| {
        read_serial_samples_with(&config, collector, |event| {
            let _ = sender.blocking_send(event);
        })
    }))
}

/// Wait for a stream to complete, giving up after `limit`
pub async fn collect_samples(mut stream: SensorStream, limit: Duration) -> CsaResult<Collection> {
    let mut collected = 0;
    let requested = stream.requested();

    let drained = tokio::time::timeout(limit, async {
        while let Some(event) = stream.recv().await {
            match event {
                SensorEvent::Sample { index, value } => {
                    collected = index + 1;
                    trace!(index, value, "sample");
                }
                SensorEvent::Skipped { line } => debug!(line = %line, "skipped line"),
            }
        }
    })
    .await;

    if drained.is_err() {
        stream.cancel();
        return Err(CsaError::Timeout { collected, requested });
    }
    stream.join().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use csa_simulation::{SensorSimConfig, SensorSimulator};
    use std::io::{BufReader, Cursor, ErrorKind, Read};

    struct Silent;

    impl Read for Silent {
        fn read(&mut self, _out: &mut [u8]) -> std::io::Result<usize> {
            std::thread::sleep(Duration::from_millis(2));
            Err(std::io::Error::new(ErrorKind::TimedOut, "no data"))
        }
    }

    fn simulated(seed: u64, garbage_ratio: f64) -> SensorSimulator {
        SensorSimulator::new(SensorSimConfig {
            seed: Some(seed),
            garbage_ratio,
            ..SensorSimConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_stream_from_simulated_sensor() {
        let reader = simulated(7, 0.1).into_reader(100);
        let collector = SampleCollector::new(100, Duration::from_secs(5)).unwrap();

        let collection = collect_samples(spawn_reader(reader, collector), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(collection.samples.len(), 100);
        assert!(collection.samples.iter().all(|&v| (0..=1023).contains(&v)));
    }

    #[tokio::test]
    async fn test_stream_matches_direct_samples() {
        let expected: Vec<i64> = {
            let mut sim = simulated(3, 0.0);
            (0..20).map(|_| sim.next_sample()).collect()
        };

        let reader = simulated(3, 0.0).into_reader(20);
        let collector = SampleCollector::new(20, Duration::from_secs(5)).unwrap();
        let mut stream = spawn_reader(reader, collector);

        let mut seen = Vec::new();
        while let Some(event) = stream.recv().await {
            if let SensorEvent::Sample { value, .. } = event {
                seen.push(value);
            }
        }
        let collection = stream.finish().await.unwrap();

        assert_eq!(seen, expected);
        assert_eq!(collection.samples, expected);
        assert_eq!(collection.skipped, 0);
    }

    #[tokio::test]
    async fn test_short_input_surfaces_error() {
        let reader = Cursor::new(b"1\n2\nnope\n".to_vec());
        let collector = SampleCollector::new(10, Duration::from_secs(5)).unwrap();
        let result = collect_samples(spawn_reader(reader, collector), Duration::from_secs(5)).await;
        assert!(matches!(result, Err(CsaError::AcquisitionError { .. })));
    }

    #[tokio::test]
    async fn test_collect_timeout() {
        let reader = BufReader::new(Silent);
        let collector = SampleCollector::new(10, Duration::from_millis(500)).unwrap();
        let result = collect_samples(spawn_reader(reader, collector), Duration::from_millis(50)).await;
        assert_eq!(result, Err(CsaError::Timeout { collected: 0, requested: 10 }));
    }
}

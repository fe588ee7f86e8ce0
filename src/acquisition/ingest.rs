// src/acquisition/ingest.rs
//! Background ingestion of sample lines from the transport

use crossbeam::channel::Sender;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::acquisition::protocol::parse_line;
use crate::acquisition::sample_buffer::SampleBuffer;
use crate::actuator::TransportError;
use crate::error::AssistResult;

/// Any line-oriented byte source the worker can own
///
/// Sources with a read timeout should return `TimedOut` or `WouldBlock` when
/// no data arrived; both are treated as "no data yet".
pub trait LineSource: BufRead + Send + 'static {}

impl<T: BufRead + Send + 'static> LineSource for T {}

/// Shared connected flag for the ingestion link
#[derive(Debug, Clone, Default)]
pub struct LinkStatus {
    connected: Arc<AtomicBool>,
}

impl LinkStatus {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}

/// Counters reported when the worker exits
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestStats {
    pub frames: u64,
    pub malformed: u64,
    /// Read failure that ended ingestion, if any
    pub error: Option<TransportError>,
}

impl IngestStats {
    /// Surface a link failure that ended ingestion as a transport error
    pub fn check(&self) -> AssistResult<()> {
        match &self.error {
            Some(error) => Err(error.clone().into()),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    frames: AtomicU64,
    malformed: AtomicU64,
}

pub struct IngestWorker {
    buffer: Arc<SampleBuffer>,
    link: LinkStatus,
    poll_interval: Duration,
}

impl IngestWorker {
    pub fn new(buffer: Arc<SampleBuffer>, link: LinkStatus, poll_interval: Duration) -> Self {
        Self {
            buffer,
            link,
            poll_interval,
        }
    }

    /// Start the ingestion thread
    ///
    /// `data_ready` receives a unit after each stored frame; a full channel
    /// means the consumer already has a wake-up pending, so the signal is
    /// dropped.
    pub fn spawn<S: LineSource>(self, source: S, data_ready: Sender<()>) -> io::Result<IngestHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());
        self.link.set_connected(true);

        let thread_stop = Arc::clone(&stop);
        let thread_counters = Arc::clone(&counters);
        let link = self.link.clone();
        let thread = thread::Builder::new()
            .name("emg-ingest".to_string())
            .spawn(move || self.run(source, data_ready, &thread_stop, &thread_counters))?;

        Ok(IngestHandle {
            stop,
            counters,
            link,
            thread: Some(thread),
        })
    }

    fn run<S: LineSource>(
        self,
        mut source: S,
        data_ready: Sender<()>,
        stop: &AtomicBool,
        counters: &Counters,
    ) -> Option<TransportError> {
        let mut line = Vec::new();
        let mut failure = None;

        while !stop.load(Ordering::Acquire) {
            match source.read_until(b'\n', &mut line) {
                Ok(0) => {
                    // Trailing bytes left over from a timed-out read
                    if !line.is_empty() {
                        self.store_line(&line, &data_ready, counters);
                    }
                    tracing::info!("sample stream ended");
                    break;
                }
                Ok(_) => {
                    self.store_line(&line, &data_ready, counters);
                    line.clear();
                }
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                    ) =>
                {
                    // Partial line stays in `line` until the rest arrives
                    thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "sample link read failed");
                    failure = Some(TransportError::Read(e.to_string()));
                    break;
                }
            }
        }

        self.link.set_connected(false);
        failure
    }

    /// Parse one raw line; undecodable or malformed lines are counted and dropped
    fn store_line(&self, raw: &[u8], data_ready: &Sender<()>, counters: &Counters) {
        let parsed = match std::str::from_utf8(raw) {
            Ok(text) => parse_line(text).map_err(|e| (e.to_string(), text.trim_end().to_string())),
            Err(e) => Err((e.to_string(), String::from_utf8_lossy(raw).trim_end().to_string())),
        };
        match parsed {
            Ok(frame) => {
                self.buffer.push(frame);
                counters.frames.fetch_add(1, Ordering::Relaxed);
                let _ = data_ready.try_send(());
            }
            Err((error, line)) => {
                counters.malformed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%error, %line, "discarding malformed line");
            }
        }
    }
}

/// Owner handle for a running ingestion thread
pub struct IngestHandle {
    stop: Arc<AtomicBool>,
    counters: Arc<Counters>,
    link: LinkStatus,
    thread: Option<JoinHandle<Option<TransportError>>>,
}

impl IngestHandle {
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn link(&self) -> &LinkStatus {
        &self.link
    }

    /// Frames stored so far
    pub fn frames(&self) -> u64 {
        self.counters.frames.load(Ordering::Relaxed)
    }

    /// Ask the worker to stop after its current read
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Wait for the worker to exit and collect its counters
    pub fn join(mut self) -> IngestStats {
        let error = match self.thread.take().map(JoinHandle::join) {
            Some(Ok(error)) => error,
            Some(Err(_)) => Some(TransportError::Read("ingestion thread panicked".to_string())),
            None => None,
        };
        IngestStats {
            frames: self.counters.frames.load(Ordering::Relaxed),
            malformed: self.counters.malformed.load(Ordering::Relaxed),
            error,
        }
    }
}

impl Drop for IngestHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistError;
    use std::io::Cursor;

    fn worker(buffer: &Arc<SampleBuffer>, link: &LinkStatus) -> IngestWorker {
        IngestWorker::new(Arc::clone(buffer), link.clone(), Duration::from_millis(1))
    }

    #[test]
    fn test_ingests_until_end_of_stream() {
        let buffer = Arc::new(SampleBuffer::new(100));
        let link = LinkStatus::default();
        let (tx, rx) = crossbeam::channel::bounded(1);

        let input = "EMG:0.1\nEMG:0.2,0.3\ngarbage\nEMG:0.4,0.5\n";
        let handle = worker(&buffer, &link).spawn(Cursor::new(input), tx).unwrap();
        let stats = handle.join();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.error, None);
        assert!(stats.check().is_ok());
        assert_eq!(buffer.snapshot_reference(10), vec![0.1, 0.2, 0.4]);
        assert_eq!(buffer.snapshot_affected(10), vec![0.3, 0.5]);
        assert!(!link.is_connected());
        // Wake-ups coalesce into the single slot
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_undecodable_bytes_are_skipped() {
        let buffer = Arc::new(SampleBuffer::new(100));
        let link = LinkStatus::default();
        let (tx, _rx) = crossbeam::channel::bounded(1);

        let mut input = b"EMG:0.1,0.2\n".to_vec();
        input.extend_from_slice(b"\xFF\xFE\n");
        input.extend_from_slice(b"EMG:0.3,0.4\nEMG:0.5,0.6");
        let stats = worker(&buffer, &link).spawn(Cursor::new(input), tx).unwrap().join();

        assert_eq!(stats.frames, 3);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.error, None);
        // The final line has no terminator and is still stored
        assert_eq!(buffer.snapshot_affected(10), vec![0.2, 0.4, 0.6]);
    }

    struct FailingSource;

    impl io::Read for FailingSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "cable pulled"))
        }
    }

    impl BufRead for FailingSource {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "cable pulled"))
        }

        fn consume(&mut self, _amt: usize) {}
    }

    #[test]
    fn test_read_error_disconnects() {
        let buffer = Arc::new(SampleBuffer::new(100));
        let link = LinkStatus::default();
        let (tx, _rx) = crossbeam::channel::bounded(1);

        let stats = worker(&buffer, &link).spawn(FailingSource, tx).unwrap().join();
        assert!(matches!(stats.error, Some(TransportError::Read(_))));
        assert!(matches!(
            stats.check(),
            Err(AssistError::Transport { ref operation, .. }) if operation == "read_samples"
        ));
        assert!(!link.is_connected());
        assert!(buffer.is_empty());
    }
}

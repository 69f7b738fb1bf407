//! Speech capture boundary
//!
//! Stands in for a speech-to-text engine. The concrete source reads lines
//! from stdin on a dedicated thread; each non-empty line is one final
//! utterance, lowercase-normalized per the input contract. Capture errors
//! are surfaced as events and never reach the classifier, and every exit
//! of the reader ends with a terminal event so the pipeline can clear the
//! listening state.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events sent from the capture source to the interpreter pipeline
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Partial transcription, forwarded to the UI but never classified
    Interim(String),
    /// Final transcription, lowercase-normalized, ready for classification
    Final(String),
    /// Capture failed mid-session; listening stops, the daemon does not
    Error(String),
    /// Capture input ended normally; listening stops
    Ended,
}

/// Errors that can occur starting or running capture
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("speech capture is already running")]
    AlreadyRunning,

    #[error("speech input is not available")]
    Unavailable,

    #[error("failed to spawn capture thread: {0}")]
    ThreadSpawn(String),
}

/// Text capture source feeding the interpreter over a channel.
///
/// Same lifecycle as any input listener: `start()` spawns the reader
/// thread, `stop()` flips the running flag and the thread winds down.
pub struct CaptureSource {
    event_tx: mpsc::Sender<CaptureEvent>,
    running: Arc<AtomicBool>,
}

impl CaptureSource {
    pub fn new(event_tx: mpsc::Sender<CaptureEvent>) -> Self {
        Self {
            event_tx,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start reading utterances from stdin on a dedicated thread
    pub fn start(&self) -> Result<(), CaptureError> {
        // The stdin lock is not Send, so it is taken inside the thread
        self.spawn_reader(|| std::io::stdin().lock())
    }

    /// Start reading utterances from the given source. Tests inject a
    /// reader here; production capture goes through `start()`.
    pub fn start_with<R>(&self, reader: R) -> Result<(), CaptureError>
    where
        R: BufRead + Send + 'static,
    {
        self.spawn_reader(move || reader)
    }

    fn spawn_reader<F, R>(&self, make_reader: F) -> Result<(), CaptureError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: BufRead,
    {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::AlreadyRunning);
        }

        let event_tx = self.event_tx.clone();
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("speech-capture".to_string())
            .spawn(move || {
                info!("capture thread started");
                read_lines(make_reader(), event_tx, Arc::clone(&running));
                running.store(false, Ordering::SeqCst);
                info!("capture thread stopped");
            })
            .map_err(|e| CaptureError::ThreadSpawn(e.to_string()))?;

        Ok(())
    }

    /// Stop listening. The reader thread exits on its next line.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn read_lines(
    reader: impl BufRead,
    event_tx: mpsc::Sender<CaptureEvent>,
    running: Arc<AtomicBool>,
) {
    for line in reader.lines() {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        match line {
            Ok(raw) => {
                let utterance = raw.trim().to_lowercase();
                if utterance.is_empty() {
                    continue;
                }
                debug!(%utterance, "captured final utterance");
                if event_tx.blocking_send(CaptureEvent::Final(utterance)).is_err() {
                    warn!("capture channel closed, stopping");
                    return;
                }
            }
            Err(e) => {
                warn!(?e, "capture read error");
                let _ = event_tx.blocking_send(CaptureEvent::Error(e.to_string()));
                return;
            }
        }
    }

    // EOF or stop(): tell the pipeline listening is over
    debug!("capture input ended");
    let _ = event_tx.blocking_send(CaptureEvent::Ended);
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor, Read};

    use super::*;

    /// Reader that blocks until the test drops the sender, then hits EOF.
    /// Keeps the capture thread alive for lifecycle tests.
    struct HeldOpen(std::sync::mpsc::Receiver<()>);

    impl Read for HeldOpen {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn test_source_starts_stopped() {
        let (tx, _rx) = mpsc::channel(32);
        let source = CaptureSource::new(tx);
        assert!(!source.is_running());
    }

    #[test]
    fn test_double_start_rejected() {
        let (tx, _rx) = mpsc::channel(32);
        let (hold_tx, hold_rx) = std::sync::mpsc::channel();
        let source = CaptureSource::new(tx);

        // The injected reader blocks, so the thread cannot exit and reset
        // the running flag before the second start is attempted.
        source.start_with(BufReader::new(HeldOpen(hold_rx))).unwrap();
        assert!(source.is_running());
        assert!(matches!(source.start(), Err(CaptureError::AlreadyRunning)));

        drop(hold_tx);
        source.stop();
    }

    #[tokio::test]
    async fn test_finals_normalized_then_ended() {
        let (tx, mut rx) = mpsc::channel(32);
        let source = CaptureSource::new(tx);
        source
            .start_with(Cursor::new("Open Camera\n\n  what time is it  \n"))
            .unwrap();

        // Non-empty lines arrive trimmed and lowercased; blanks are skipped
        match rx.recv().await {
            Some(CaptureEvent::Final(text)) => assert_eq!(text, "open camera"),
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await {
            Some(CaptureEvent::Final(text)) => assert_eq!(text, "what time is it"),
            other => panic!("unexpected event: {:?}", other),
        }

        // EOF always produces a terminal event
        assert!(matches!(rx.recv().await, Some(CaptureEvent::Ended)));
    }

    #[tokio::test]
    async fn test_ended_sent_on_immediate_eof() {
        let (tx, mut rx) = mpsc::channel(32);
        let source = CaptureSource::new(tx);
        source.start_with(Cursor::new("")).unwrap();
        assert!(matches!(rx.recv().await, Some(CaptureEvent::Ended)));
    }
}

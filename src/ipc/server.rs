//! Unix domain socket server for IPC
//!
//! Request-response for status, transcript, and typed commands, plus a
//! push stream of interpreter events for subscribed clients. The server is
//! a read-only consumer of interpreter state: its snapshot is updated by
//! the main loop's event fan-out, never by the server itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tracing::{debug, error, info, warn};

use crate::events::InterpreterEvent;
use crate::interpreter::UtteranceMsg;
use crate::transcript::SharedTranscript;

use super::protocol::{DaemonStatus, Notification, Request, Response};

/// IPC server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    state: Arc<RwLock<ServerState>>,
    shutdown_tx: broadcast::Sender<()>,
    /// Submits typed commands into the interpreter pipeline
    command_tx: mpsc::Sender<UtteranceMsg>,
    /// Source of interpreter events for subscribed clients
    event_tx: broadcast::Sender<InterpreterEvent>,
    transcript: SharedTranscript,
}

/// Shared server-side view of the daemon
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

impl Server {
    /// Create a new IPC server bound to `socket_path`
    pub fn new(
        socket_path: &Path,
        command_tx: mpsc::Sender<UtteranceMsg>,
        event_tx: broadcast::Sender<InterpreterEvent>,
        transcript: SharedTranscript,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path)
            .context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(RwLock::new(ServerState {
            status: DaemonStatus::default(),
            start_time: std::time::Instant::now(),
        }));

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            state,
            shutdown_tx,
            command_tx,
            event_tx,
            transcript,
        })
    }

    /// Update the displayed brightness/volume levels
    pub async fn set_levels(&self, brightness: u8, volume: u8) {
        let mut state = self.state.write().await;
        state.status.brightness = brightness;
        state.status.volume = volume;
    }

    /// Update the displayed foreground app (None reverts to the grid)
    pub async fn set_active_app(&self, app: Option<String>) {
        let mut state = self.state.write().await;
        if state.status.active_app != app {
            debug!(?app, "IPC server: active app updated");
        }
        state.status.active_app = app;
    }

    /// Update the displayed listening indicator
    pub async fn set_listening(&self, listening: bool) {
        self.state.write().await.status.listening = listening;
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref()
            .context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let state = Arc::clone(&self.state);
                    let command_tx = self.command_tx.clone();
                    let event_rx = self.event_tx.subscribe();
                    let transcript = Arc::clone(&self.transcript);
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = Self::handle_client(
                                stream, state, command_tx, event_rx, transcript,
                            ) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Handle a single client connection
    async fn handle_client(
        mut stream: UnixStream,
        state: Arc<RwLock<ServerState>>,
        command_tx: mpsc::Sender<UtteranceMsg>,
        mut event_rx: broadcast::Receiver<InterpreterEvent>,
        transcript: SharedTranscript,
    ) -> Result<()> {
        let mut len_buf = [0u8; 4];

        loop {
            // Read message length (4-byte little-endian)
            match stream.read_exact(&mut len_buf).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("client disconnected");
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            }

            let len = u32::from_le_bytes(len_buf) as usize;
            if len > 1024 * 1024 {
                warn!(len, "message too large, disconnecting");
                return Ok(());
            }

            // Read message body
            let mut msg_buf = vec![0u8; len];
            stream.read_exact(&mut msg_buf).await?;

            // Parse request
            let request: Request = serde_json::from_slice(&msg_buf)
                .context("failed to parse request")?;

            debug!(?request, "received request");

            let subscribe = matches!(request, Request::Subscribe);
            let response =
                Self::process_request(request, &state, &command_tx, &transcript).await;
            Self::send_message(&mut stream, &response).await?;

            // Subscribe converts the connection into a push stream; the
            // client sends no further requests on it.
            if subscribe {
                debug!("client subscribed, switching to push stream");
                return Self::push_events(stream, &mut event_rx).await;
            }
        }
    }

    /// Forward interpreter events to a subscribed client
    async fn push_events(
        mut stream: UnixStream,
        event_rx: &mut broadcast::Receiver<InterpreterEvent>,
    ) -> Result<()> {
        loop {
            match event_rx.recv().await {
                Ok(event) => {
                    Self::send_message(&mut stream, &Notification::Event(event)).await?;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Ok(());
                }
            }
        }
    }

    /// Send a length-prefixed JSON message
    async fn send_message<T: serde::Serialize>(stream: &mut UnixStream, msg: &T) -> Result<()> {
        let msg_bytes = serde_json::to_vec(msg)?;
        let msg_len = (msg_bytes.len() as u32).to_le_bytes();

        stream.write_all(&msg_len).await?;
        stream.write_all(&msg_bytes).await?;

        Ok(())
    }

    /// Process a request and return a response
    async fn process_request(
        request: Request,
        state: &Arc<RwLock<ServerState>>,
        command_tx: &mpsc::Sender<UtteranceMsg>,
        transcript: &SharedTranscript,
    ) -> Response {
        match request {
            Request::Ping => Response::Pong,

            Request::GetStatus => {
                let mut state = state.write().await;
                state.status.uptime_secs = state.start_time.elapsed().as_secs();
                Response::Status(state.status.clone())
            }

            Request::Command { text } => {
                // Same input contract as speech capture: lowercase utterance
                let msg_text = text.trim().to_lowercase();
                let (reply_tx, reply_rx) = oneshot::channel();
                let msg = UtteranceMsg {
                    text: msg_text,
                    reply: Some(reply_tx),
                };

                if command_tx.send(msg).await.is_err() {
                    return Response::Error {
                        code: "interpreter_unavailable".to_string(),
                        message: "interpreter is not running".to_string(),
                    };
                }

                match reply_rx.await {
                    Ok(outcome) => Response::Reply {
                        response: outcome.response,
                        action: outcome.action,
                    },
                    Err(_) => Response::Error {
                        code: "interpreter_unavailable".to_string(),
                        message: "interpreter dropped the command".to_string(),
                    },
                }
            }

            Request::GetTranscript => Response::Transcript {
                entries: transcript.read().await.entries(),
            },

            Request::Subscribe => Response::Subscribed,
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::RwLock;

    use super::*;
    use crate::transcript::Transcript;

    fn test_fixtures() -> (
        Arc<RwLock<ServerState>>,
        mpsc::Sender<UtteranceMsg>,
        mpsc::Receiver<UtteranceMsg>,
        SharedTranscript,
    ) {
        let state = Arc::new(RwLock::new(ServerState {
            status: DaemonStatus::default(),
            start_time: std::time::Instant::now(),
        }));
        let (tx, rx) = mpsc::channel(8);
        let transcript = Arc::new(RwLock::new(Transcript::default()));
        (state, tx, rx, transcript)
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let (state, tx, _rx, transcript) = test_fixtures();
        let response = Server::process_request(Request::Ping, &state, &tx, &transcript).await;
        assert!(matches!(response, Response::Pong));
    }

    #[tokio::test]
    async fn test_get_status_snapshot() {
        let (state, tx, _rx, transcript) = test_fixtures();
        let response =
            Server::process_request(Request::GetStatus, &state, &tx, &transcript).await;
        match response {
            Response::Status(status) => {
                assert_eq!(status.brightness, 80);
                assert_eq!(status.volume, 50);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_is_lowercased_and_replied() {
        let (state, tx, mut rx, transcript) = test_fixtures();

        let server_side = tokio::spawn(async move {
            Server::process_request(
                Request::Command { text: "Open Camera".to_string() },
                &state,
                &tx,
                &transcript,
            )
            .await
        });

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.text, "open camera");
        msg.reply
            .unwrap()
            .send(crate::interpreter::Outcome {
                response: "Opening Camera".to_string(),
                action: Some("Launched Camera app".to_string()),
                activated: None,
            })
            .unwrap();

        match server_side.await.unwrap() {
            Response::Reply { response, action } => {
                assert_eq!(response, "Opening Camera");
                assert_eq!(action.as_deref(), Some("Launched Camera app"));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_command_with_closed_interpreter_errors() {
        let (state, tx, rx, transcript) = test_fixtures();
        drop(rx);
        let response = Server::process_request(
            Request::Command { text: "hello".to_string() },
            &state,
            &tx,
            &transcript,
        )
        .await;
        assert!(matches!(response, Response::Error { .. }));
    }

    #[tokio::test]
    async fn test_get_transcript() {
        let (state, tx, _rx, transcript) = test_fixtures();
        transcript.write().await.push_user("open camera");
        let response =
            Server::process_request(Request::GetTranscript, &state, &tx, &transcript).await;
        match response {
            Response::Transcript { entries } => {
                assert_eq!(entries.len(), 1);
                assert!(entries[0].is_user);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}

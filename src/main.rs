//! jarvis-daemon: voice command interpreter for a virtual phone
//!
//! The daemon receives transcribed utterances, classifies them against a
//! fixed intent grammar, and maintains the interpreter-visible device
//! state (active app, brightness, volume). It provides:
//! - An intent classifier with ordered, first-match-wins rules
//! - An interpreter state machine with a 3-second active-app auto-clear
//! - A capture boundary for final/interim transcriptions (stdin source)
//! - An IPC server for display clients: status, transcript, typed
//!   commands, and a push stream of side-effect events

mod apps;
mod config;
mod events;
mod intent;
mod interpreter;
mod ipc;
mod lifecycle;
mod speech;
mod transcript;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::events::InterpreterEvent;
use crate::interpreter::{Interpreter, SystemClock, UtteranceMsg};
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::speech::{CaptureEvent, CaptureSource, LogSynthesizer, SpeechRequest, Synthesizer};
use crate::transcript::Transcript;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "jarvis-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(?config.socket_path, "configuration loaded");

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Create channels for inter-component communication
    // Capture source -> pipeline
    let (capture_tx, mut capture_rx) = mpsc::channel::<CaptureEvent>(32);
    // Pipeline and IPC -> interpreter
    let (command_tx, command_rx) = mpsc::channel::<UtteranceMsg>(32);
    // Interpreter -> collaborators (speech output, display, subscribers)
    let (event_tx, _event_rx) = broadcast::channel::<InterpreterEvent>(64);

    // Shared conversation history
    let transcript = Arc::new(RwLock::new(Transcript::default()));

    // Create the interpreter
    let mut interpreter = Interpreter::new(
        event_tx.clone(),
        Box::new(SystemClock),
        Arc::clone(&transcript),
    );

    // Start speech capture (runs on a dedicated thread). Failure degrades
    // to text-only operation via IPC, not a crash.
    let capture = CaptureSource::new(capture_tx);
    match capture.start() {
        Ok(()) => {
            info!("speech capture started");
            let _ = event_tx.send(InterpreterEvent::ListeningChanged { listening: true });
        }
        Err(e) => {
            error!(?e, "failed to start speech capture");
            warn!("continuing text-only - commands still accepted over IPC");
        }
    }

    // Create IPC server for display clients
    let server = Server::new(
        &config.socket_path,
        command_tx.clone(),
        event_tx.clone(),
        Arc::clone(&transcript),
    )?;

    // Speech output collaborator; unavailable synthesis is a no-op sink
    let synthesizer = LogSynthesizer;

    let mut fanout_rx = event_tx.subscribe();
    let server_for_events = &server;
    let capture_for_errors = &capture;
    let transcript_for_notices = Arc::clone(&transcript);

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the interpreter (processes utterances and timed reverts)
        _ = interpreter.run(command_rx) => {
            info!("interpreter exited");
        }

        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Forward capture events into the pipeline
        _ = async {
            while let Some(event) = capture_rx.recv().await {
                match event {
                    CaptureEvent::Final(text) => {
                        if command_tx.send(UtteranceMsg::new(text)).await.is_err() {
                            break;
                        }
                    }
                    CaptureEvent::Interim(text) => {
                        // Display preview only, never classified
                        let _ = event_tx.send(InterpreterEvent::Hearing { text });
                    }
                    CaptureEvent::Error(message) => {
                        warn!(%message, "speech capture error");
                        capture_for_errors.stop();
                        transcript_for_notices
                            .write()
                            .await
                            .push_assistant(format!("Speech capture stopped: {}", message));
                        let _ = event_tx
                            .send(InterpreterEvent::ListeningChanged { listening: false });
                    }
                    CaptureEvent::Ended => {
                        info!("speech capture ended");
                        capture_for_errors.stop();
                        let _ = event_tx
                            .send(InterpreterEvent::ListeningChanged { listening: false });
                    }
                }
            }
        } => {
            info!("capture pipeline exited");
        }

        // Fan interpreter events out to the collaborators
        _ = async {
            loop {
                match fanout_rx.recv().await {
                    Ok(event) => match event {
                        InterpreterEvent::Speak { text } => {
                            synthesizer.speak(&SpeechRequest::new(text));
                        }
                        InterpreterEvent::ShowApp { app, .. } => {
                            server_for_events.set_active_app(Some(app)).await;
                        }
                        InterpreterEvent::ShowGrid => {
                            server_for_events.set_active_app(None).await;
                        }
                        InterpreterEvent::LevelsChanged { brightness, volume } => {
                            server_for_events.set_levels(brightness, volume).await;
                        }
                        InterpreterEvent::ListeningChanged { listening } => {
                            server_for_events.set_listening(listening).await;
                        }
                        InterpreterEvent::Hearing { .. } => {
                            // Subscribers already receive it from the broadcast
                        }
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "event fan-out lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("event fan-out exited");
        }

        // Wait for shutdown signal
        _ = shutdown.wait() => {
            info!("shutdown signal received");
        }
    }

    // Cleanup
    info!("shutting down...");

    capture.stop();
    server.shutdown().await;

    info!("jarvis-daemon stopped");

    Ok(())
}

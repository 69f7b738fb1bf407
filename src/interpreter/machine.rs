//! Core interpreter implementation
//!
//! One utterance is processed to completion at a time. The only deferred
//! work is the active-app auto-clear: a single deadline slot, overwritten
//! on every new activation, so a stale clear can never fire after a newer
//! app has been shown.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::apps::{self, App};
use crate::events::{InterpreterEvent, ACTIVE_APP_SECS};
use crate::intent::{classify, Intent, Params};
use crate::transcript::SharedTranscript;

const FALLBACK_RESPONSE: &str = "I can help you open apps, make calls, send messages, \
     adjust settings, and more. What would you like me to do?";

/// Supplies the wall-clock string embedded in time-query responses.
/// Injected so the interpreter itself stays deterministic.
pub trait Clock: Send {
    fn now(&self) -> String;
}

/// Production clock: local time, "9:41:00 AM" style
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> String {
        chrono::Local::now().format("%-I:%M:%S %p").to_string()
    }
}

/// Interpreter-visible device state. Single writer: the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterState {
    /// App currently in the foreground, if any
    pub active_app: Option<&'static App>,
    /// Screen brightness, always in [0, 100]
    pub brightness: u8,
    /// Media volume, always in [0, 100]
    pub volume: u8,
}

impl Default for InterpreterState {
    fn default() -> Self {
        Self {
            active_app: None,
            brightness: 80,
            volume: 50,
        }
    }
}

/// Result of one command cycle
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Text to show and speak
    pub response: String,
    /// Short label of what fired, for status display
    pub action: Option<String>,
    /// App activated by this cycle, if any (arms the auto-clear timer)
    pub activated: Option<&'static App>,
}

impl Outcome {
    fn new(response: impl Into<String>, action: Option<&str>) -> Self {
        Self {
            response: response.into(),
            action: action.map(str::to_string),
            activated: None,
        }
    }

    fn launching(mut self, app: &'static App) -> Self {
        self.activated = Some(app);
        self
    }
}

/// A final utterance submitted for interpretation. `reply` is used by the
/// IPC command path; the capture path fires and forgets.
#[derive(Debug)]
pub struct UtteranceMsg {
    pub text: String,
    pub reply: Option<oneshot::Sender<Outcome>>,
}

impl UtteranceMsg {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply: None,
        }
    }
}

/// The interpreter state machine
pub struct Interpreter {
    state: InterpreterState,
    event_tx: broadcast::Sender<InterpreterEvent>,
    clock: Box<dyn Clock>,
    transcript: SharedTranscript,
}

impl Interpreter {
    pub fn new(
        event_tx: broadcast::Sender<InterpreterEvent>,
        clock: Box<dyn Clock>,
        transcript: SharedTranscript,
    ) -> Self {
        Self {
            state: InterpreterState::default(),
            event_tx,
            clock,
            transcript,
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> InterpreterState {
        self.state
    }

    /// Run the interpreter, processing utterances until the channel closes.
    ///
    /// `clear_at` is the one outstanding auto-clear timer: every activation
    /// overwrites it, so exactly one revert fires, for the latest app.
    pub async fn run(&mut self, mut rx: mpsc::Receiver<UtteranceMsg>) {
        info!("interpreter started");
        let mut clear_at: Option<Instant> = None;

        loop {
            tokio::select! {
                maybe = rx.recv() => {
                    let Some(msg) = maybe else { break };
                    let outcome = self.process(&msg.text).await;
                    if outcome.activated.is_some() {
                        clear_at =
                            Some(Instant::now() + Duration::from_secs(ACTIVE_APP_SECS));
                    }
                    if let Some(reply) = msg.reply {
                        let _ = reply.send(outcome);
                    }
                }
                _ = sleep_until_opt(clear_at) => {
                    clear_at = None;
                    if self.state.active_app.take().is_some() {
                        debug!("active app timed out, reverting to grid");
                        let _ = self.event_tx.send(InterpreterEvent::ShowGrid);
                    }
                }
            }
        }

        info!("interpreter stopped");
    }

    /// One full command cycle: classify, execute, record the transcript.
    async fn process(&mut self, utterance: &str) -> Outcome {
        let (intent, params) = classify(utterance);
        debug!(%intent, utterance, "utterance classified");

        self.transcript.write().await.push_user(utterance);
        let outcome = self.handle(intent, &params);
        self.transcript.write().await.push_assistant(&outcome.response);

        if let Some(action) = &outcome.action {
            info!(%intent, %action, "command executed");
        }

        outcome
    }

    /// Execute one classified intent against the current state
    pub fn handle(&mut self, intent: Intent, params: &Params) -> Outcome {
        let outcome = match intent {
            Intent::OpenApp => self.open_app(params),
            Intent::Call => self.start_call(params),
            Intent::SendMessage => self.compose_message(params),
            Intent::TakePhoto => self.take_photo(),
            Intent::PlayMusic => self.play_music(params),
            Intent::BrightnessUp => self.adjust_brightness(true),
            Intent::BrightnessDown => self.adjust_brightness(false),
            Intent::VolumeUp => self.adjust_volume(true),
            Intent::VolumeDown => self.adjust_volume(false),
            Intent::TimeQuery => {
                Outcome::new(format!("It's {}", self.clock.now()), Some("Time query"))
            }
            Intent::BatteryQuery => Outcome::new(
                "Battery is at 85% and charging",
                Some("Battery status check"),
            ),
            Intent::WifiQuery => Outcome::new("WiFi is connected", Some("WiFi status check")),
            Intent::Greeting => Outcome::new(
                "Hello! How can I assist you today?",
                Some("Greeting"),
            ),
            Intent::Unknown => Outcome::new(FALLBACK_RESPONSE, Some("Awaiting command")),
        };

        let _ = self.event_tx.send(InterpreterEvent::Speak {
            text: outcome.response.clone(),
        });

        outcome
    }

    fn open_app(&mut self, params: &Params) -> Outcome {
        match params.app {
            Some(app) => {
                self.activate(app);
                Outcome::new(
                    format!("Opening {}", app),
                    Some(&format!("Launched {} app", app)),
                )
                .launching(app)
            }
            None => Outcome::new("Which app would you like me to open?", None),
        }
    }

    fn start_call(&mut self, params: &Params) -> Outcome {
        let name = params.contact.as_deref().unwrap_or("contact");
        self.activate(apps::PHONE);
        Outcome::new(
            format!("Calling {}...", name),
            Some(&format!("Initiating call to {}", name)),
        )
        .launching(apps::PHONE)
    }

    fn compose_message(&mut self, params: &Params) -> Outcome {
        let name = params.contact.as_deref().unwrap_or("contact");
        self.activate(apps::MESSAGES);
        Outcome::new(
            format!("Opening messages to {}", name),
            Some(&format!("Composing message to {}", name)),
        )
        .launching(apps::MESSAGES)
    }

    fn take_photo(&mut self) -> Outcome {
        self.activate(apps::CAMERA);
        Outcome::new("Opening camera", Some("Camera ready")).launching(apps::CAMERA)
    }

    fn play_music(&mut self, params: &Params) -> Outcome {
        let song = params.song.as_deref().unwrap_or("music");
        self.activate(apps::MUSIC);
        Outcome::new(format!("Playing {}", song), Some("Music player active"))
            .launching(apps::MUSIC)
    }

    fn adjust_brightness(&mut self, up: bool) -> Outcome {
        let (new, word) = if up {
            ((self.state.brightness + 20).min(100), "increased")
        } else {
            (self.state.brightness.saturating_sub(20), "decreased")
        };
        self.state.brightness = new;
        self.emit_levels();
        Outcome::new(
            format!("Brightness {} to {}%", word, new),
            Some("Brightness adjusted"),
        )
    }

    fn adjust_volume(&mut self, up: bool) -> Outcome {
        let (new, word) = if up {
            ((self.state.volume + 20).min(100), "increased")
        } else {
            (self.state.volume.saturating_sub(20), "decreased")
        };
        self.state.volume = new;
        self.emit_levels();
        Outcome::new(
            format!("Volume {} to {}%", word, new),
            Some("Volume adjusted"),
        )
    }

    /// Bring an app to the foreground, superseding any prior activation
    fn activate(&mut self, app: &'static App) {
        self.state.active_app = Some(app);
        let _ = self.event_tx.send(InterpreterEvent::ShowApp {
            app: app.name.to_string(),
            for_secs: ACTIVE_APP_SECS,
        });
    }

    fn emit_levels(&self) {
        let _ = self.event_tx.send(InterpreterEvent::LevelsChanged {
            brightness: self.state.brightness,
            volume: self.state.volume,
        });
    }
}

/// Pending-forever when no deadline is armed, so the select arm only
/// completes while an auto-clear is outstanding.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

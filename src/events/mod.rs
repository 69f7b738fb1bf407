//! Side-effect descriptors emitted by the interpreter
//!
//! The interpreter never touches audio or rendering APIs. Each command
//! cycle produces events describing what the external collaborators
//! (speech output, display) should do; they are broadcast to subscribers.

use serde::{Deserialize, Serialize};

/// How long an activated app stays in the foreground before the view
/// reverts to the home-screen grid.
pub const ACTIVE_APP_SECS: u64 = 3;

/// Events emitted by the interpreter during a command cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterpreterEvent {
    /// Speak the response text aloud
    Speak { text: String },

    /// Show the named app in the foreground for `for_secs` seconds,
    /// then revert to the grid unless superseded
    ShowApp { app: String, for_secs: u64 },

    /// Revert the display to the home-screen grid
    ShowGrid,

    /// Brightness or volume changed
    LevelsChanged { brightness: u8, volume: u8 },

    /// Speech capture started or stopped listening
    ListeningChanged { listening: bool },

    /// Interim transcription preview, shown but never classified
    Hearing { text: String },
}

impl std::fmt::Display for InterpreterEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpreterEvent::Speak { text } => write!(f, "SPEAK ({})", text),
            InterpreterEvent::ShowApp { app, for_secs } => {
                write!(f, "SHOW_APP ({} for {}s)", app, for_secs)
            }
            InterpreterEvent::ShowGrid => write!(f, "SHOW_GRID"),
            InterpreterEvent::LevelsChanged { brightness, volume } => {
                write!(f, "LEVELS_CHANGED (brightness {}%, volume {}%)", brightness, volume)
            }
            InterpreterEvent::ListeningChanged { listening } => {
                write!(f, "LISTENING_CHANGED ({})", listening)
            }
            InterpreterEvent::Hearing { text } => write!(f, "HEARING ({})", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = InterpreterEvent::ShowApp {
            app: "Camera".to_string(),
            for_secs: ACTIVE_APP_SECS,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("show_app"));
        assert!(json.contains("Camera"));
        assert!(json.contains("3"));
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"show_grid"}"#;
        let event: InterpreterEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, InterpreterEvent::ShowGrid));
    }
}

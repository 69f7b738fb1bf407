//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian
//! length. The display collaborator reads interpreter state and the
//! transcript here; `Command` is the text-only injection path, feeding the
//! same pipeline as a final speech capture result.

use serde::{Deserialize, Serialize};

use crate::events::InterpreterEvent;
use crate::transcript::Entry;

/// Requests from UI to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Ping to check connectivity
    Ping,

    /// Request the current interpreter state snapshot
    GetStatus,

    /// Submit a typed command utterance (same pipeline as speech)
    Command { text: String },

    /// Request the conversation transcript
    GetTranscript,

    /// Switch this connection to a push stream of interpreter events
    Subscribe,
}

/// Responses from daemon to UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Pong response to ping
    Pong,

    /// Current interpreter state snapshot
    Status(DaemonStatus),

    /// Result of a submitted command
    Reply {
        response: String,
        action: Option<String>,
    },

    /// Conversation history, oldest first
    Transcript { entries: Vec<Entry> },

    /// Subscription confirmed; interpreter events follow as notifications
    Subscribed,

    /// Error response
    Error { code: String, message: String },
}

/// Push notification to subscribed clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    Event(InterpreterEvent),
}

/// Full interpreter state snapshot for display consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Screen brightness, 0-100
    pub brightness: u8,

    /// Media volume, 0-100
    pub volume: u8,

    /// Name of the app in the foreground, if any
    pub active_app: Option<String>,

    /// Whether speech capture is listening
    pub listening: bool,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            brightness: 80,
            volume: 50,
            active_app: None,
            listening: false,
            uptime_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let req = Request::Command {
            text: "open camera".to_string(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("command"));
        assert!(json.contains("open camera"));
    }

    #[test]
    fn test_request_deserialization() {
        let json = r#"{"type":"get_status"}"#;
        let req: Request = serde_json::from_str(json).unwrap();
        assert!(matches!(req, Request::GetStatus));
    }

    #[test]
    fn test_status_defaults_match_initial_state() {
        let status = DaemonStatus::default();
        assert_eq!(status.brightness, 80);
        assert_eq!(status.volume, 50);
        assert!(status.active_app.is_none());
    }

    #[test]
    fn test_notification_serialization() {
        let n = Notification::Event(InterpreterEvent::ShowGrid);
        let json = serde_json::to_string(&n).unwrap();
        assert!(json.contains("event"));
        assert!(json.contains("show_grid"));
    }
}

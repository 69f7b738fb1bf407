//! Speech output boundary
//!
//! The interpreter only produces text; a synthesizer turns Speak events
//! into audio. When no synthesizer backend is attached, speaking is a
//! silent no-op, not an error.

use serde::{Deserialize, Serialize};
use tracing::info;

/// Fixed speaking rate for all responses
pub const SPEAKING_RATE: f32 = 1.1;
/// Fixed voice pitch for all responses
pub const PITCH: f32 = 1.0;

/// A fully-specified synthesis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
}

impl SpeechRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: SPEAKING_RATE,
            pitch: PITCH,
        }
    }
}

/// Sink for response speech
pub trait Synthesizer: Send + Sync {
    fn speak(&self, request: &SpeechRequest);
}

/// Default backend: logs the request instead of producing audio
pub struct LogSynthesizer;

impl Synthesizer for LogSynthesizer {
    fn speak(&self, request: &SpeechRequest) {
        info!(text = %request.text, rate = request.rate, "speaking");
    }
}

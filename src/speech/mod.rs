//! Speech collaborator boundaries
//!
//! Capture produces candidate transcriptions; only final results reach the
//! classifier. Synthesis consumes response text. Neither side holds any
//! decision logic.

mod capture;
mod synthesis;

pub use capture::{CaptureError, CaptureEvent, CaptureSource};
pub use synthesis::{LogSynthesizer, SpeechRequest, Synthesizer};

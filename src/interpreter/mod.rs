//! Interpreter state machine
//!
//! Owns the interpreter-visible state (active app, brightness, volume),
//! executes classified intents, and emits side-effect descriptors. States
//! are Idle and AppActive(app); any app-naming intent moves to
//! AppActive, and a 3-second timer reverts to Idle unless superseded.

mod machine;

pub use machine::{Clock, Interpreter, InterpreterState, Outcome, SystemClock, UtteranceMsg};

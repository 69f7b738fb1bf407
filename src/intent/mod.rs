//! Intent classification for command utterances
//!
//! Maps a lowercase utterance to exactly one intent from a fixed grammar,
//! extracting any parameters (app, contact name, song title) along the way.

mod classifier;

pub use classifier::{classify, Intent, Params};

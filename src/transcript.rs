//! In-memory conversation transcript
//!
//! One entry per user utterance or assistant response. The interpreter is
//! the only writer; the IPC server reads snapshots for history rendering.
//! Nothing is persisted across restarts.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Oldest entries are dropped past this bound
pub const MAX_ENTRIES: usize = 200;

/// A single transcript line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

/// Bounded conversation history
#[derive(Debug, Default)]
pub struct Transcript {
    entries: VecDeque<Entry>,
}

pub type SharedTranscript = Arc<RwLock<Transcript>>;

impl Transcript {
    /// Record a user utterance
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(text.into(), true);
    }

    /// Record an assistant response or status notice
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.push(text.into(), false);
    }

    fn push(&mut self, text: String, is_user: bool) {
        self.entries.push_back(Entry {
            text,
            is_user,
            timestamp: Utc::now(),
        });
        while self.entries.len() > MAX_ENTRIES {
            self.entries.pop_front();
        }
    }

    /// Snapshot of all entries, oldest first
    pub fn entries(&self) -> Vec<Entry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

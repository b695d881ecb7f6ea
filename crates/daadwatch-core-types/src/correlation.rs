//! Run correlation identifier
//!
//! Every invocation of the watcher gets a fresh `RunId`. It is attached to the
//! run's tracing span so all events from fetch to persist can be grouped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a single fetch → diff → report → persist run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a new time-ordered RunId (UUIDv7)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an existing id, e.g. one supplied by an external scheduler
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

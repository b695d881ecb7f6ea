//! Collaborator interfaces the run orchestrator calls.
//!
//! The three traits are synchronous black boxes: each call returns a complete
//! result or an [`ExError`]. In-memory implementations live here too, for
//! tests and dry runs.

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::ProgrammeRecord;
use crate::snapshot;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Source of the complete current catalog.
#[allow(clippy::result_large_err)]
pub trait Fetcher: Send + Sync {
    /// Fetch every programme currently listed.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Fetch` if the full catalog could not be obtained.
    /// Partial results are never returned as success.
    fn fetch_all(&self) -> Result<Vec<ProgrammeRecord>>;
}

/// Single-slot persistence for the last-seen catalog.
#[allow(clippy::result_large_err)]
pub trait SnapshotStore: Send + Sync {
    /// Load the previous snapshot; `None` means no snapshot exists yet.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::CorruptSnapshot` if a snapshot exists but cannot
    /// be read back as records.
    fn load(&self) -> Result<Option<Vec<ProgrammeRecord>>>;

    /// Replace the snapshot in full, returning the digest of what was written.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Persistence` if the write fails.
    fn save(&self, records: &[ProgrammeRecord]) -> Result<String>;
}

/// Delivers one report segment to the recipient channel.
#[allow(clippy::result_large_err)]
pub trait Notifier: Send + Sync {
    /// Send a single segment. One attempt; retries belong to the implementation.
    ///
    /// # Errors
    ///
    /// Returns `ExErrorKind::Delivery` if the segment was not accepted.
    fn send(&self, segment: &str) -> Result<()>;
}

/// Fetcher returning a fixed catalog, or a fixed failure.
pub struct StaticFetcher {
    outcome: std::result::Result<Vec<ProgrammeRecord>, String>,
}

impl StaticFetcher {
    pub fn new(records: Vec<ProgrammeRecord>) -> Self {
        Self {
            outcome: Ok(records),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
        }
    }
}

impl Fetcher for StaticFetcher {
    fn fetch_all(&self) -> Result<Vec<ProgrammeRecord>> {
        match &self.outcome {
            Ok(records) => Ok(records.clone()),
            Err(message) => Err(ExError::new(ExErrorKind::Fetch)
                .with_op("fetch_all")
                .with_message(message.clone())),
        }
    }
}

/// Snapshot store kept in memory. Digests match the filesystem store's.
#[derive(Default)]
pub struct MemorySnapshotStore {
    slot: Mutex<Option<Vec<ProgrammeRecord>>>,
    corrupt: bool,
    fail_saves: bool,
    saves: Mutex<usize>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(records: Vec<ProgrammeRecord>) -> Self {
        Self {
            slot: Mutex::new(Some(records)),
            ..Self::default()
        }
    }

    /// Every `load` fails with `CorruptSnapshot`
    pub fn corrupt() -> Self {
        Self {
            corrupt: true,
            ..Self::default()
        }
    }

    /// Every `save` fails with `Persistence`
    pub fn failing_saves(mut self) -> Self {
        self.fail_saves = true;
        self
    }

    /// Current contents of the slot
    pub fn snapshot(&self) -> Option<Vec<ProgrammeRecord>> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<Vec<ProgrammeRecord>>> {
        if self.corrupt {
            return Err(ExError::new(ExErrorKind::CorruptSnapshot)
                .with_op("load_snapshot")
                .with_message("in-memory snapshot marked corrupt"));
        }
        let slot = self.slot.lock().map_err(|_| poisoned("load_snapshot"))?;
        Ok(slot.clone())
    }

    fn save(&self, records: &[ProgrammeRecord]) -> Result<String> {
        if self.fail_saves {
            return Err(ExError::new(ExErrorKind::Persistence)
                .with_op("save_snapshot")
                .with_message("in-memory store rejects writes"));
        }
        let digest = snapshot::digest(&snapshot::encode(records)?);
        *self.slot.lock().map_err(|_| poisoned("save_snapshot"))? = Some(records.to_vec());
        *self.saves.lock().map_err(|_| poisoned("save_snapshot"))? += 1;
        Ok(digest)
    }
}

/// Notifier that records every segment, optionally failing chosen attempts.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<String>>,
    attempts: Mutex<usize>,
    fail_on: BTreeSet<usize>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the given zero-based attempts with `Delivery`
    pub fn failing_on(attempts: impl IntoIterator<Item = usize>) -> Self {
        Self {
            fail_on: attempts.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Segments accepted so far, in order
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.lock().map(|n| *n).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, segment: &str) -> Result<()> {
        let attempt = {
            let mut n = self.attempts.lock().map_err(|_| poisoned("send_segment"))?;
            *n += 1;
            *n - 1
        };
        if self.fail_on.contains(&attempt) {
            return Err(ExError::new(ExErrorKind::Delivery)
                .with_op("send_segment")
                .with_message(format!("attempt {} rejected", attempt)));
        }
        self.sent
            .lock()
            .map_err(|_| poisoned("send_segment"))?
            .push(segment.to_string());
        Ok(())
    }
}

fn poisoned(op: &str) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op(op)
        .with_message("lock poisoned")
}

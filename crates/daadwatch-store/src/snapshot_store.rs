//! Filesystem snapshot store
//!
//! One JSON document holding the last-seen catalog. Loads distinguish "no
//! snapshot yet" from "snapshot exists but is unusable"; saves replace the
//! file atomically.

#![allow(clippy::result_large_err)]

use crate::atomic::atomic_write;
use crate::errors::{corrupt_snapshot, io_error, persistence_error, Result};
use daadwatch_core::model::ProgrammeRecord;
use daadwatch_core::ports::SnapshotStore;
use daadwatch_core::snapshot;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default snapshot file name
pub const DEFAULT_SNAPSHOT_FILE: &str = "daad_programs.json";

#[derive(Debug, Clone)]
pub struct FsSnapshotStore {
    path: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock file guarding this snapshot: the snapshot path with `.lock` appended
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from(DEFAULT_SNAPSHOT_FILE));
        name.push(".lock");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for FsSnapshotStore {
    fn load(&self) -> Result<Option<Vec<ProgrammeRecord>>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no snapshot on disk");
                return Ok(None);
            }
            Err(e) => return Err(corrupt_snapshot(&self.path, io_error("read_snapshot", e))),
        };
        let records = snapshot::decode(&bytes).map_err(|e| corrupt_snapshot(&self.path, e))?;
        tracing::debug!(
            path = %self.path.display(),
            programmes = records.len(),
            "snapshot loaded"
        );
        Ok(Some(records))
    }

    fn save(&self, records: &[ProgrammeRecord]) -> Result<String> {
        let bytes = snapshot::encode(records).map_err(|e| persistence_error(&self.path, e))?;
        atomic_write(&self.path, &bytes).map_err(|e| persistence_error(&self.path, e))?;
        let digest = snapshot::digest(&bytes);
        tracing::debug!(
            path = %self.path.display(),
            programmes = records.len(),
            digest = %digest,
            "snapshot saved"
        );
        Ok(digest)
    }
}

//! Error handling for daadwatch-store
//!
//! Wraps daadwatch-core ExError with store-specific helpers

use daadwatch_core::errors::{ExError, ExErrorKind};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

/// Create a corrupt snapshot error for a file that exists but cannot be used
pub fn corrupt_snapshot(path: &Path, cause: ExError) -> ExError {
    ExError::new(ExErrorKind::CorruptSnapshot)
        .with_op("load_snapshot")
        .with_message(format!("snapshot at {} is unreadable", path.display()))
        .with_source(cause)
}

/// Create a persistence error for a failed snapshot write
pub fn persistence_error(path: &Path, cause: ExError) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("save_snapshot")
        .with_message(format!("failed to write snapshot to {}", path.display()))
        .with_source(cause)
}

/// Create a lock contention error
pub fn lock_held(path: &Path) -> ExError {
    ExError::new(ExErrorKind::Concurrency)
        .with_op("acquire_run_lock")
        .with_message(format!(
            "another run holds the lock at {}; remove it if no run is active",
            path.display()
        ))
}

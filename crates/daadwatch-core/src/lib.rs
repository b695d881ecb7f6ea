//! daadwatch core - catalog snapshot diff kernel
//!
//! This crate holds everything about a watcher run that is pure computation:
//! - Programme record model and the canonical (normalized) form
//! - Normalizer, Differ and Reporter
//! - Snapshot document codec and digest
//! - Collaborator traits (`Fetcher`, `SnapshotStore`, `Notifier`) with
//!   in-memory implementations
//! - Error and logging facilities shared by the other crates
//!
//! No network, no filesystem.

pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod normalize;
pub mod ports;
pub mod snapshot;

// Macros refer to schema constants through this path.
pub use daadwatch_core_types;

pub use diff::{
    compute_diff, dedupe_catalog, render, render_baseline, ChangeCounts, ChangeSet, DiffOptions,
    DuplicatePolicy, Report, ReportOptions,
};
pub use errors::{ExError, ExErrorKind, Result};
pub use model::{CanonicalRecord, OfferingDate, ProgrammeId, ProgrammeRecord};
pub use normalize::{normalize, Normalizer};
pub use ports::{Fetcher, Notifier, SnapshotStore};

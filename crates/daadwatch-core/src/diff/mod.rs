//! Snapshot diff engine.
//!
//! Compares the previously persisted catalog with the freshly fetched one
//! and produces the three change sets, then renders them into bounded-length
//! report segments.
//!
//! ## Entry point
//!
//! ```ignore
//! use daadwatch_core::diff::{compute_diff, render, DiffOptions, ReportOptions};
//!
//! let changes = compute_diff(&previous, &current, &DiffOptions::default())?;
//! let report = render(&changes, &ReportOptions::default());
//! for segment in &report.segments { notifier.send(segment)?; }
//! ```
//!
//! ## Guarantees
//!
//! - **Partition**: every identifier seen on either side lands in exactly one
//!   of added / removed / updated / unchanged.
//! - **Normalized equality**: field reordering, language reordering and
//!   offering-date reordering are never changes.
//! - **Determinism**: identical inputs produce byte-identical reports.
//! - **Lossless segmentation**: concatenating segments reproduces the document.

pub mod engine;
pub mod model;
pub mod report;

pub use engine::{compute_diff, dedupe_catalog};
pub use model::{ChangeCounts, ChangeSet, DiffOptions, DuplicatePolicy};
pub use report::{group_stable, render, render_baseline, segment, Report, ReportOptions};

//! Watcher run orchestration.
//!
//! ## Pipeline (in order):
//! 1. Acquire the run lock (hard stop if held)
//! 2. Fetch the full catalog (failure aborts; snapshot untouched) and apply
//!    the duplicate policy, so no snapshot is ever saved with repeated ids
//! 3. Load the previous snapshot (corrupt snapshot aborts)
//! 4. No snapshot: record the baseline, optionally announce it
//! 5. Diff and render
//! 6. Deliver segments (failures counted, never fatal)
//! 7. dry_run short-circuit (no delivery, no writes; report kept as preview)
//! 8. Persist the fetched catalog as the new snapshot

#![allow(clippy::result_large_err)]

use daadwatch_core::diff::{
    compute_diff, dedupe_catalog, render, render_baseline, ChangeCounts, DiffOptions, ReportOptions,
};
use daadwatch_core::errors::Result;
use daadwatch_core::model::ProgrammeRecord;
use daadwatch_core::ports::{Fetcher, Notifier, SnapshotStore};
use daadwatch_core::snapshot;
use daadwatch_core::{log_op_end, log_op_error, log_op_start};
use daadwatch_core_types::RunId;
use daadwatch_store::RunLock;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;

/// Options for one run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub diff: DiffOptions,
    pub report: ReportOptions,
    /// Send a notice when the first snapshot is recorded
    pub announce_baseline: bool,
    /// Compute and render, but neither deliver nor persist
    pub dry_run: bool,
    /// Lock file guarding the read-diff-write sequence; `None` disables locking
    pub lock_path: Option<PathBuf>,
}

/// Collaborators and options for a run
pub struct RunContext<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub store: &'a dyn SnapshotStore,
    pub notifier: &'a dyn Notifier,
    pub options: RunOptions,
}

/// How a successful run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// No prior snapshot; the fetched catalog became the baseline
    Baseline { programmes: usize, digest: String },
    /// Nothing to report; snapshot rewritten
    NoChanges { programmes: usize, digest: String },
    /// A report was rendered and delivered (fully or partially)
    Changed {
        counts: ChangeCounts,
        segments_sent: usize,
        segments_failed: usize,
        digest: String,
        /// Rendered report of a dry run, which is never delivered
        #[serde(skip)]
        preview: Option<String>,
    },
}

impl RunOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Baseline { .. } => "baseline",
            RunOutcome::NoChanges { .. } => "no_changes",
            RunOutcome::Changed { .. } => "changed",
        }
    }

    /// Report a dry run rendered instead of sending
    pub fn preview(&self) -> Option<&str> {
        match self {
            RunOutcome::Changed { preview, .. } => preview.as_deref(),
            _ => None,
        }
    }

    /// Digest of the snapshot written (or, in a dry run, that would be written)
    pub fn digest(&self) -> &str {
        match self {
            RunOutcome::Baseline { digest, .. }
            | RunOutcome::NoChanges { digest, .. }
            | RunOutcome::Changed { digest, .. } => digest,
        }
    }
}

/// Execute one complete watcher run.
///
/// # Errors
///
/// - `Concurrency` if another run holds the lock
/// - `Fetch` if the catalog could not be fetched; the snapshot is untouched
/// - `CorruptSnapshot` if the stored snapshot cannot be read
/// - `DuplicateIdentifier` under the `Reject` policy
/// - `Persistence` if the new snapshot could not be written
pub fn run_once(ctx: &RunContext<'_>) -> Result<RunOutcome> {
    let run_id = RunId::new();
    let span = tracing::info_span!("watch_run", run_id = %run_id, dry_run = ctx.options.dry_run);
    let _entered = span.enter();

    log_op_start!("watch_run");
    let start = Instant::now();

    let outcome = run_impl(ctx).map_err(|e| {
        log_op_error!(
            "watch_run",
            e,
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "watch_run",
        duration_ms = start.elapsed().as_millis() as u64,
        outcome = outcome.label(),
        digest = outcome.digest()
    );
    Ok(outcome)
}

fn run_impl(ctx: &RunContext<'_>) -> Result<RunOutcome> {
    let opts = &ctx.options;

    let _lock = match &opts.lock_path {
        Some(path) => Some(RunLock::acquire(path)?),
        None => None,
    };

    let current = dedupe_catalog(fetch_catalog(ctx.fetcher)?, opts.diff.duplicate_policy)?;

    let previous = match ctx.store.load()? {
        Some(previous) => previous,
        None => {
            tracing::info!(programmes = current.len(), "no previous snapshot, recording baseline");
            if opts.announce_baseline && !opts.dry_run {
                let notice = render_baseline(current.len(), &opts.report);
                deliver(ctx.notifier, &notice.segments);
            }
            let digest = persist(ctx, &current)?;
            return Ok(RunOutcome::Baseline {
                programmes: current.len(),
                digest,
            });
        }
    };

    let changes = compute_diff(&previous, &current, &opts.diff)?;
    let counts = changes.counts();
    tracing::info!(
        added = counts.added,
        removed = counts.removed,
        updated = counts.updated,
        unchanged = counts.unchanged,
        duplicates_dropped = changes.duplicates_dropped,
        "catalog diffed"
    );

    let report = render(&changes, &opts.report);
    if report.is_empty() {
        let digest = persist(ctx, &current)?;
        return Ok(RunOutcome::NoChanges {
            programmes: current.len(),
            digest,
        });
    }

    let (segments_sent, segments_failed) = if opts.dry_run {
        tracing::info!(segments = report.segments.len(), "dry run, report not delivered");
        (0, 0)
    } else {
        deliver(ctx.notifier, &report.segments)
    };
    let preview = opts.dry_run.then(|| report.document.clone());

    // Delivery failures never block persistence.
    let digest = persist(ctx, &current)?;
    Ok(RunOutcome::Changed {
        counts,
        segments_sent,
        segments_failed,
        digest,
        preview,
    })
}

fn fetch_catalog(fetcher: &dyn Fetcher) -> Result<Vec<ProgrammeRecord>> {
    log_op_start!("fetch_catalog");
    let start = Instant::now();
    let records = fetcher.fetch_all().map_err(|e| {
        log_op_error!(
            "fetch_catalog",
            e,
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;
    log_op_end!(
        "fetch_catalog",
        duration_ms = start.elapsed().as_millis() as u64,
        programmes = records.len()
    );
    Ok(records)
}

/// Send segments in order; returns (sent, failed)
fn deliver(notifier: &dyn Notifier, segments: &[String]) -> (usize, usize) {
    log_op_start!("deliver_report", segments = segments.len());
    let start = Instant::now();
    let mut sent = 0;
    let mut failed = 0;
    for (index, segment) in segments.iter().enumerate() {
        match notifier.send(segment) {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(
                    segment = index,
                    err.code = e.code(),
                    err.message = e.message(),
                    "segment delivery failed"
                );
            }
        }
    }
    log_op_end!(
        "deliver_report",
        duration_ms = start.elapsed().as_millis() as u64,
        sent = sent,
        failed = failed
    );
    (sent, failed)
}

/// Save the catalog, or in a dry run only compute the digest it would get
fn persist(ctx: &RunContext<'_>, current: &[ProgrammeRecord]) -> Result<String> {
    if ctx.options.dry_run {
        return Ok(snapshot::digest(&snapshot::encode(current)?));
    }
    log_op_start!("save_snapshot");
    let start = Instant::now();
    let digest = ctx.store.save(current).map_err(|e| {
        log_op_error!(
            "save_snapshot",
            e,
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;
    log_op_end!(
        "save_snapshot",
        duration_ms = start.elapsed().as_millis() as u64,
        programmes = current.len()
    );
    Ok(digest)
}

//! Offline diff of two snapshot files

use anyhow::{anyhow, Context};
use clap::Args;
use daadwatch_core::diff::{compute_diff, render};
use daadwatch_core::model::ProgrammeRecord;
use daadwatch_core::ports::SnapshotStore;
use daadwatch_engine::WatchConfig;
use daadwatch_store::FsSnapshotStore;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// Earlier snapshot
    pub previous: PathBuf,

    /// Later snapshot
    pub current: PathBuf,

    /// Print change counts as JSON instead of the report
    #[arg(long)]
    pub counts: bool,
}

pub fn execute(args: DiffArgs, config: WatchConfig) -> anyhow::Result<()> {
    let config = super::validated(config)?;
    let previous = load(&args.previous)?;
    let current = load(&args.current)?;

    let changes = compute_diff(&previous, &current, &config.diff_options())
        .context("cannot diff snapshots")?;

    if args.counts {
        println!("{}", serde_json::to_string_pretty(&changes.counts())?);
        return Ok(());
    }

    let report = render(&changes, &config.report_options());
    if report.is_empty() {
        println!("No changes.");
    } else {
        print!("{}", report.document);
    }
    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Vec<ProgrammeRecord>> {
    FsSnapshotStore::new(path)
        .load()
        .with_context(|| format!("cannot read {}", path.display()))?
        .ok_or_else(|| anyhow!("{} does not exist", path.display()))
}

//! Watcher run command

use anyhow::Context;
use clap::Args;
use daadwatch_client::{DaadFetcher, TelegramNotifier};
use daadwatch_core::errors::Result as ExResult;
use daadwatch_core::ports::Notifier;
use daadwatch_engine::{run_once, RunContext, RunOptions, WatchConfig};
use daadwatch_store::FsSnapshotStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Snapshot file (overrides config and DAADWATCH_SNAPSHOT)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Diff and print the report; nothing is sent or saved
    #[arg(long)]
    pub dry_run: bool,

    /// Print report segments to stdout instead of sending them to Telegram
    #[arg(long)]
    pub stdout: bool,
}

/// Prints each segment, separated by a blank line
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn send(&self, segment: &str) -> ExResult<()> {
        println!("{}\n", segment);
        Ok(())
    }
}

pub fn execute(args: RunArgs, mut config: WatchConfig) -> anyhow::Result<()> {
    if let Some(path) = args.snapshot {
        config.snapshot.path = path;
    }
    let config = super::validated(config)?;

    let fetcher = DaadFetcher::new(config.fetch.clone()).context("cannot build listing client")?;
    let store = FsSnapshotStore::new(&config.snapshot.path);
    // Dry runs never deliver, so they need no Telegram credentials.
    let notifier: Box<dyn Notifier> = if args.stdout || args.dry_run {
        Box::new(StdoutNotifier)
    } else {
        Box::new(
            TelegramNotifier::new(config.telegram.clone())
                .context("cannot build Telegram notifier")?,
        )
    };

    let ctx = RunContext {
        fetcher: &fetcher,
        store: &store,
        notifier: notifier.as_ref(),
        options: RunOptions {
            diff: config.diff_options(),
            report: config.report_options(),
            announce_baseline: config.report.announce_baseline,
            dry_run: args.dry_run,
            lock_path: config.snapshot.lock.then(|| store.lock_path()),
        },
    };

    let outcome = run_once(&ctx)
        .with_context(|| format!("run failed (snapshot {})", store.path().display()))?;
    if let Some(report) = outcome.preview() {
        println!("{}", report);
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

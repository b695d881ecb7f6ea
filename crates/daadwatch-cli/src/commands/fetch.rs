//! One-shot catalog download

use anyhow::Context;
use clap::Args;
use daadwatch_client::DaadFetcher;
use daadwatch_core::diff::dedupe_catalog;
use daadwatch_core::ports::{Fetcher, SnapshotStore};
use daadwatch_engine::WatchConfig;
use daadwatch_store::FsSnapshotStore;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Output file (defaults to the configured snapshot path)
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn execute(args: FetchArgs, mut config: WatchConfig) -> anyhow::Result<()> {
    if let Some(out) = args.out {
        config.snapshot.path = out;
    }
    let config = super::validated(config)?;

    let fetcher = DaadFetcher::new(config.fetch).context("cannot build listing client")?;
    let records = fetcher.fetch_all().context("catalog fetch failed")?;
    let records = dedupe_catalog(records, config.diff.duplicate_policy)
        .context("catalog not saved: duplicate programme ids")?;

    let store = FsSnapshotStore::new(&config.snapshot.path);
    let digest = store
        .save(&records)
        .with_context(|| format!("cannot write {}", store.path().display()))?;

    println!("Fetched {} programmes", records.len());
    println!("  file: {}", store.path().display());
    println!("  sha256: {}", digest);
    Ok(())
}

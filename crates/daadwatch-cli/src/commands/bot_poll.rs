//! `/getjson` bot command, one pass

use anyhow::Context;
use clap::Args;
use daadwatch_client::TelegramClient;
use daadwatch_engine::bot::{poll_once, PollOptions};
use daadwatch_engine::WatchConfig;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct BotPollArgs {
    /// Snapshot file served to /getjson (overrides config and DAADWATCH_SNAPSHOT)
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Long-poll timeout in seconds (overrides telegram.poll_timeout_secs)
    #[arg(long)]
    pub timeout: Option<u64>,
}

pub fn execute(args: BotPollArgs, mut config: WatchConfig) -> anyhow::Result<()> {
    if let Some(path) = args.snapshot {
        config.snapshot.path = path;
    }
    if let Some(timeout) = args.timeout {
        config.telegram.poll_timeout_secs = timeout;
    }
    let config = super::validated(config)?;

    let options = PollOptions {
        snapshot_path: config.snapshot.path.clone(),
        document_name: config.telegram.document_name.clone(),
        poll_timeout_secs: config.telegram.poll_timeout_secs,
    };
    let client = TelegramClient::new(config.telegram).context("cannot build Telegram client")?;

    let summary = poll_once(&client, &options).context("bot poll failed")?;
    println!("Processed {} updates", summary.updates);
    println!("  documents sent: {}", summary.documents_sent);
    println!("  not found replies: {}", summary.not_found_replies);
    if summary.reply_failures > 0 {
        println!("  failed replies: {}", summary.reply_failures);
    }
    Ok(())
}

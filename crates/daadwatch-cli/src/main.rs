//! daadwatch CLI
//!
//! Watches the DAAD international-programmes catalog and reports changes

use clap::{Parser, Subcommand};
use daadwatch_core::logging_facility::{self, Profile};
use daadwatch_engine::WatchConfig;
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "daadwatch")]
#[command(about = "daadwatch - DAAD study-programme catalog watcher", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log JSON lines instead of human-readable output
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch, diff against the stored snapshot, notify, save
    Run(commands::run::RunArgs),
    /// Fetch the full catalog and write it as a snapshot
    Fetch(commands::fetch::FetchArgs),
    /// Diff two snapshot files and print the report
    Diff(commands::diff::DiffArgs),
    /// Answer pending /getjson bot commands once
    BotPoll(commands::bot_poll::BotPollArgs),
}

fn main() {
    let cli = Cli::parse();

    logging_facility::init(if cli.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let result = WatchConfig::load(cli.config.as_deref())
        .map_err(anyhow::Error::from)
        .and_then(|config| match cli.command {
            Commands::Run(args) => commands::run::execute(args, config),
            Commands::Fetch(args) => commands::fetch::execute(args, config),
            Commands::Diff(args) => commands::diff::execute(args, config),
            Commands::BotPoll(args) => commands::bot_poll::execute(args, config),
        });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

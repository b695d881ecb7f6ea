//! daadwatch engine - run orchestration
//!
//! Ties the collaborators to the core: one watcher run fetches the catalog,
//! diffs it against the stored snapshot, delivers the report and persists the
//! new snapshot. Also hosts the `/getjson` bot command handler and the
//! configuration model.

pub mod bot;
pub mod config;
pub mod run;

pub use config::WatchConfig;
pub use run::{run_once, RunContext, RunOptions, RunOutcome};

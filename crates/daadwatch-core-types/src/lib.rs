//! Core types shared across the daadwatch crates
//!
//! - **Correlation**: `RunId`, one per watcher invocation
//! - **Secrets**: `Secret` for credentials that must never reach a log line
//! - **Schema constants**: canonical structured-logging field keys and event names

pub mod correlation;
pub mod schema;
pub mod secret;

pub use correlation::RunId;
pub use secret::Secret;

//! Watcher configuration.
//!
//! Layers, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. Environment (a `.env` file in the working directory is loaded first)
//! 4. CLI flags, applied by the binary after [`WatchConfig::load`]
//!
//! ```toml
//! [fetch]
//! page_size = 100
//!
//! [telegram]
//! chat_id = "-1001234567890"
//!
//! [snapshot]
//! path = "/var/lib/daadwatch/daad_programs.json"
//!
//! [report]
//! group_by = "degree"
//!
//! [diff]
//! duplicate_policy = "reject"
//! ignored_fields = ["score"]
//! ```

#![allow(clippy::result_large_err)]

use daadwatch_client::{FetchConfig, TelegramConfig};
use daadwatch_core::diff::{DiffOptions, DuplicatePolicy, ReportOptions};
use daadwatch_core::errors::{ExError, ExErrorKind, Result};
use daadwatch_core_types::Secret;
use daadwatch_store::snapshot_store::DEFAULT_SNAPSHOT_FILE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Bot token; the unprefixed name is still accepted
pub const ENV_BOT_TOKEN: &[&str] = &["DAADWATCH_BOT_TOKEN", "BOT_TOKEN"];
pub const ENV_CHAT_ID: &str = "DAADWATCH_CHAT_ID";
pub const ENV_SNAPSHOT_PATH: &str = "DAADWATCH_SNAPSHOT";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    /// Guard each run with a lock file next to the snapshot
    pub lock: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            lock: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    pub max_segment_chars: usize,
    /// Canonical field for sub-grouping added programmes; empty for a flat list
    pub group_by: String,
    pub placeholder: String,
    pub include_updated: bool,
    /// Send a one-segment notice when the first snapshot is recorded
    pub announce_baseline: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let defaults = ReportOptions::default();
        Self {
            title: defaults.title,
            max_segment_chars: defaults.max_segment_chars,
            group_by: defaults.group_by.unwrap_or_default(),
            placeholder: defaults.placeholder,
            include_updated: defaults.include_updated,
            announce_baseline: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    pub duplicate_policy: DuplicatePolicy,
    pub ignored_fields: Vec<String>,
}

/// Complete watcher configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub fetch: FetchConfig,
    pub telegram: TelegramConfig,
    pub snapshot: SnapshotConfig,
    pub report: ReportConfig,
    pub diff: DiffConfig,
}

impl WatchConfig {
    /// Defaults, overlaid with `path` (if given) and the process environment
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "ignoring unreadable .env file");
            }
        }
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// # Errors
    ///
    /// `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExError::new(ExErrorKind::InvalidConfig)
                .with_op("load_config")
                .with_message(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text).map_err(|e| {
            let message = format!("{}: {}", path.display(), e.message());
            e.with_message(message)
        })
    }

    /// # Errors
    ///
    /// `InvalidConfig` if the text is not a valid configuration.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| {
            ExError::new(ExErrorKind::InvalidConfig)
                .with_op("load_config")
                .with_message(e.to_string())
        })
    }

    /// Overlay environment values; `lookup` is `std::env::var` outside tests
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(token) = ENV_BOT_TOKEN.iter().find_map(|k| non_empty(*k)) {
            self.telegram.bot_token = Secret::new(token.trim());
        }
        if let Some(chat_id) = non_empty(ENV_CHAT_ID) {
            self.telegram.chat_id = chat_id.trim().to_string();
        }
        if let Some(path) = non_empty(ENV_SNAPSHOT_PATH) {
            self.snapshot.path = PathBuf::from(path);
        }
    }

    /// Reject settings no run could succeed with
    ///
    /// Credentials are not checked here; commands that need them fail when
    /// building their client.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| {
            Err(ExError::new(ExErrorKind::InvalidConfig)
                .with_op("validate_config")
                .with_message(msg.to_string()))
        };
        if self.fetch.base_url.trim().is_empty() {
            return invalid("fetch.base_url must not be empty");
        }
        if self.fetch.page_size == 0 {
            return invalid("fetch.page_size must be positive");
        }
        if self.fetch.max_pages == 0 {
            return invalid("fetch.max_pages must be positive");
        }
        if self.report.max_segment_chars == 0 {
            return invalid("report.max_segment_chars must be positive");
        }
        if self.snapshot.path.as_os_str().is_empty() {
            return invalid("snapshot.path must not be empty");
        }
        Ok(())
    }

    pub fn report_options(&self) -> ReportOptions {
        let group_by = self.report.group_by.trim();
        ReportOptions {
            title: self.report.title.clone(),
            max_segment_chars: self.report.max_segment_chars,
            group_by: (!group_by.is_empty()).then(|| group_by.to_string()),
            placeholder: self.report.placeholder.clone(),
            include_updated: self.report.include_updated,
        }
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            duplicate_policy: self.diff.duplicate_policy,
            ignored_fields: self.diff.ignored_fields.clone(),
        }
    }
}

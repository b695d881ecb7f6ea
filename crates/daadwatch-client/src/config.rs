//! Collaborator configuration sections
//!
//! Each client receives its own section at construction; defaults target
//! the public DAAD listing and the Telegram Bot API.

use daadwatch_core_types::Secret;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str =
    "https://www2.daad.de/deutschland/studienangebote/international-programmes/api/solr/en/search.json";
pub const DEFAULT_REFERER: &str =
    "https://www2.daad.de/deutschland/studienangebote/international-programmes/en/result/?q=";
pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

/// Listing API settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub referer: String,
    pub user_agent: String,
    /// `limit` query parameter
    pub page_size: usize,
    /// `sort` query parameter
    pub sort: u32,
    /// Upper bound on requests per fetch
    pub max_pages: usize,
    pub timeout_secs: u64,
    /// Attempts per page for 429/5xx and transport errors
    pub max_retries: usize,
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            page_size: 100,
            sort: 4,
            max_pages: 500,
            timeout_secs: 30,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Telegram Bot API settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: Secret,
    /// Recipient of change reports
    pub chat_id: String,
    pub api_base: String,
    pub timeout_secs: u64,
    /// Long-poll timeout for `getUpdates`
    pub poll_timeout_secs: u64,
    /// File name shown for documents sent in reply to `/getjson`
    pub document_name: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: Secret::default(),
            chat_id: String::new(),
            api_base: DEFAULT_TELEGRAM_API.to_string(),
            timeout_secs: 30,
            poll_timeout_secs: 30,
            document_name: "daad_programs.txt".to_string(),
        }
    }
}

impl TelegramConfig {
    /// Request timeout, long enough to cover a full long poll
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs + self.poll_timeout_secs)
    }
}

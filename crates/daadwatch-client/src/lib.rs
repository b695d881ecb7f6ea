//! daadwatch client - blocking HTTP collaborators
//!
//! - [`DaadFetcher`]: pages the DAAD international-programmes listing API
//! - [`TelegramClient`]: Bot API calls (`sendMessage`, `sendDocument`, `getUpdates`)
//! - [`TelegramNotifier`]: report delivery over `sendMessage`

pub mod config;
pub mod daad;
pub mod errors;
pub mod telegram;

pub use config::{FetchConfig, TelegramConfig};
pub use daad::DaadFetcher;
pub use errors::ClientError;
pub use telegram::{BotTransport, TelegramClient, TelegramNotifier, Update};

//! `/getjson` command handler.
//!
//! One pass over pending bot updates: every `/getjson` message is answered
//! with the current snapshot file as a document, or a short notice when no
//! snapshot exists yet. Processed updates are then acknowledged so the next
//! pass does not see them again.

#![allow(clippy::result_large_err)]

use daadwatch_client::errors::delivery_error;
use daadwatch_client::BotTransport;
use daadwatch_core::errors::Result;
use daadwatch_core::{log_op_end, log_op_error, log_op_start};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;

pub const GET_JSON_COMMAND: &str = "/getjson";
pub const NOT_FOUND_REPLY: &str = "JSON file not found.";

#[derive(Debug, Clone)]
pub struct PollOptions {
    pub snapshot_path: PathBuf,
    /// File name the snapshot is sent under
    pub document_name: String,
    pub poll_timeout_secs: u64,
}

/// What one poll pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub updates: usize,
    pub documents_sent: usize,
    pub not_found_replies: usize,
    pub reply_failures: usize,
    /// Offset sent as acknowledgement, if any update was seen
    pub acknowledged: Option<i64>,
}

/// True for `/getjson`, also in the `/getjson@SomeBot` group-chat form
pub fn is_get_json(text: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|cmd| cmd.split('@').next())
        .is_some_and(|cmd| cmd == GET_JSON_COMMAND)
}

/// Handle pending updates once.
///
/// Reply failures are counted and logged; they do not stop the pass.
///
/// # Errors
///
/// `Delivery` if updates cannot be fetched or acknowledged.
pub fn poll_once(transport: &dyn BotTransport, options: &PollOptions) -> Result<PollSummary> {
    log_op_start!("bot_poll");
    let start = Instant::now();
    let summary = poll_impl(transport, options).map_err(|e| {
        log_op_error!(
            "bot_poll",
            e,
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;
    log_op_end!(
        "bot_poll",
        duration_ms = start.elapsed().as_millis() as u64,
        updates = summary.updates,
        documents_sent = summary.documents_sent
    );
    Ok(summary)
}

fn poll_impl(transport: &dyn BotTransport, options: &PollOptions) -> Result<PollSummary> {
    let updates = transport
        .get_updates(None, options.poll_timeout_secs)
        .map_err(|e| delivery_error("get_updates", e))?;

    let mut summary = PollSummary {
        updates: updates.len(),
        ..PollSummary::default()
    };
    let mut next_offset = None;

    for update in &updates {
        next_offset = Some(update.update_id + 1);
        let Some(message) = &update.message else {
            continue;
        };
        if !message.text.as_deref().is_some_and(is_get_json) {
            continue;
        }
        let chat_id = message.chat.id.to_string();
        let reply = match read_snapshot(&options.snapshot_path) {
            Ok(Some(content)) => transport
                .send_document(&chat_id, &options.document_name, content)
                .map(|()| summary.documents_sent += 1),
            Ok(None) => transport
                .send_message(&chat_id, NOT_FOUND_REPLY)
                .map(|()| summary.not_found_replies += 1),
            Err(e) => {
                tracing::warn!(error = %e, path = %options.snapshot_path.display(), "snapshot unreadable");
                transport
                    .send_message(&chat_id, NOT_FOUND_REPLY)
                    .map(|()| summary.not_found_replies += 1)
            }
        };
        if let Err(e) = reply {
            summary.reply_failures += 1;
            tracing::warn!(chat_id = %chat_id, error = %e, "reply to /getjson failed");
        }
    }

    if let Some(offset) = next_offset {
        transport
            .acknowledge(offset)
            .map_err(|e| delivery_error("acknowledge_updates", e))?;
        summary.acknowledged = Some(offset);
    }
    Ok(summary)
}

fn read_snapshot(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_matching() {
        assert!(is_get_json("/getjson"));
        assert!(is_get_json("  /getjson please"));
        assert!(is_get_json("/getjson@daad_watch_bot"));
        assert!(!is_get_json("/getjsonx"));
        assert!(!is_get_json("getjson"));
        assert!(!is_get_json(""));
    }
}

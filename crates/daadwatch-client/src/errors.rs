//! Client error types
//!
//! Transport-level failures are typed here and converted into the canonical
//! `ExError` at the collaborator boundary, where the kind (`Fetch` or
//! `Delivery`) is known.

use daadwatch_core::errors::{ExError, ExErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or body-read failure. The URL is stripped so bot
    /// tokens never reach logs.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    /// Telegram answered `ok: false`
    #[error("Telegram API error: {0}")]
    Api(String),

    #[error("pagination did not terminate after {pages} pages")]
    PageLimit { pages: usize },

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Http(err.without_url())
    }
}

impl ClientError {
    /// Convert into the canonical error with the given kind
    pub fn into_ex(self, kind: ExErrorKind, op: &str) -> ExError {
        ExError::new(kind)
            .with_op(op.to_string())
            .with_message(self.to_string())
    }
}

/// Create a fetch error
pub fn fetch_error(op: &str, err: ClientError) -> ExError {
    err.into_ex(ExErrorKind::Fetch, op)
}

/// Create a delivery error
pub fn delivery_error(op: &str, err: ClientError) -> ExError {
    err.into_ex(ExErrorKind::Delivery, op)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_maps_to_fetch_kind() {
        let err = fetch_error(
            "fetch_page",
            ClientError::Status {
                status: 503,
                body: "maintenance".to_string(),
            },
        );
        assert_eq!(err.kind(), ExErrorKind::Fetch);
        assert_eq!(err.op(), Some("fetch_page"));
        assert_eq!(err.message(), "HTTP 503: maintenance");
    }

    #[test]
    fn test_api_error_maps_to_delivery_kind() {
        let err = delivery_error("send_message", ClientError::Api("chat not found".into()));
        assert_eq!(err.kind(), ExErrorKind::Delivery);
        assert!(err.message().contains("chat not found"));
    }
}

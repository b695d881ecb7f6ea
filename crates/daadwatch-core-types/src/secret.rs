//! Redacting wrapper for credentials
//!
//! Bot tokens end up inside request URLs, so they must never be printed via
//! `Debug`/`Display` (config dumps, error messages, tracing fields).

use serde::{Deserialize, Deserializer};
use std::fmt;

/// A string credential that redacts itself when formatted
///
/// ```
/// use daadwatch_core_types::Secret;
///
/// let token = Secret::new("123:abc");
/// assert_eq!(format!("{token:?}"), "***REDACTED***");
/// assert_eq!(token.expose(), "123:abc");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw value; only for building the outgoing request
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when no usable credential was configured
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redact() {
        let s = Secret::new("999:token");
        assert!(!format!("{s:?}").contains("999"));
        assert!(!format!("{s}").contains("token"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(Secret::default().is_blank());
        assert!(Secret::new("   ").is_blank());
        assert!(!Secret::new("x").is_blank());
    }

    #[test]
    fn test_deserialize_from_string() {
        #[derive(Deserialize, Debug)]
        struct Cfg {
            token: Secret,
        }
        let cfg: Cfg = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(cfg.token.expose(), "abc");
        assert!(!format!("{cfg:?}").contains("abc"));
    }
}

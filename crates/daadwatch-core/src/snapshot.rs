//! Snapshot document codec and digest.
//!
//! A snapshot is a JSON array of raw programme records, pretty-printed with
//! two-space indentation. The digest is the SHA-256 of the encoded bytes.
//!
//! ## Determinism Guarantees
//!
//! - Same records in the same order → same bytes → same digest
//! - Field order inside each record is preserved as fetched

use crate::errors::{ExError, ExErrorKind, Result};
use crate::model::ProgrammeRecord;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Encode records as the on-disk snapshot document
///
/// # Errors
///
/// Returns `Serialization` if JSON encoding fails.
pub fn encode(records: &[ProgrammeRecord]) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Decode a snapshot document
///
/// # Errors
///
/// Returns `CorruptSnapshot` if the bytes are not a JSON array or any entry is
/// not a valid programme record.
pub fn decode(bytes: &[u8]) -> Result<Vec<ProgrammeRecord>> {
    let values: Vec<Value> = serde_json::from_slice(bytes).map_err(|e| {
        ExError::new(ExErrorKind::CorruptSnapshot)
            .with_op("decode_snapshot")
            .with_message(format!("snapshot is not a JSON array of records: {}", e))
    })?;
    ProgrammeRecord::from_values(values).map_err(|e| {
        ExError::new(ExErrorKind::CorruptSnapshot)
            .with_op("decode_snapshot")
            .with_message("snapshot contains an invalid record")
            .with_source(e)
    })
}

/// Hex-encoded SHA-256 of a byte slice (64 characters)
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_decode_preserves_records() {
        let records = ProgrammeRecord::from_values(vec![
            json!({"id": 2, "courseName": "B"}),
            json!({"id": "1", "city": "Bonn"}),
        ])
        .unwrap();
        let bytes = encode(&records).unwrap();
        assert_eq!(decode(&bytes).unwrap(), records);
    }

    #[test]
    fn test_encoding_uses_two_space_indent() {
        let records = ProgrammeRecord::from_values(vec![json!({"id": 1})]).unwrap();
        let text = String::from_utf8(encode(&records).unwrap()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": 1\n  }\n]"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"{not json").unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::CorruptSnapshot);
    }

    #[test]
    fn test_decode_rejects_record_without_id() {
        let err = decode(br#"[{"id": 1}, {"courseName": "X"}]"#).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::CorruptSnapshot);
        assert_eq!(
            err.source_error().map(|e| e.kind()),
            Some(ExErrorKind::MissingIdentifier)
        );
    }

    #[test]
    fn test_digest_is_stable_hex() {
        let d = digest(b"[]\n");
        assert_eq!(d.len(), 64);
        assert_eq!(d, digest(b"[]\n"));
        assert_ne!(d, digest(b"[ ]\n"));
    }
}

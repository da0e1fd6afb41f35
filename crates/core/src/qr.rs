//! QR payload codec for student check-in codes.
//!
//! The payload format `student:<token>` is printed on existing cards and must
//! stay bit-exact. Parsing happens before any directory lookup so a malformed
//! scan never reaches the database.

use crate::error::CoreError;

/// Literal prefix of every student QR payload.
pub const QR_PREFIX: &str = "student:";

/// Build the QR payload for a check-in token.
pub fn encode_payload(token: &str) -> String {
    format!("{QR_PREFIX}{token}")
}

/// Extract the check-in token from a scanned payload.
///
/// Rejects anything that does not start with `student:` or carries an empty
/// token.
pub fn decode_payload(payload: &str) -> Result<&str, CoreError> {
    let token = payload
        .strip_prefix(QR_PREFIX)
        .ok_or_else(|| CoreError::Validation("Invalid QR code format".into()))?;
    if token.trim().is_empty() {
        return Err(CoreError::Validation("QR code carries no check-in token".into()));
    }
    Ok(token)
}

/// Generate a fresh opaque check-in token.
pub fn new_checkin_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_literal_prefix() {
        assert_eq!(
            encode_payload("3f0c9a2e-0000-4000-8000-000000000001"),
            "student:3f0c9a2e-0000-4000-8000-000000000001"
        );
    }

    #[test]
    fn decode_extracts_token() {
        assert_eq!(decode_payload("student:abc-123").unwrap(), "abc-123");
    }

    #[test]
    fn decode_rejects_other_prefixes() {
        assert!(matches!(
            decode_payload("teacher:abc"),
            Err(CoreError::Validation(_))
        ));
        assert!(decode_payload("Student:abc").is_err());
        assert!(decode_payload("abc").is_err());
        assert!(decode_payload("").is_err());
    }

    #[test]
    fn decode_rejects_empty_token() {
        assert!(decode_payload("student:").is_err());
        assert!(decode_payload("student:   ").is_err());
    }

    #[test]
    fn generated_tokens_are_unique_and_decodable() {
        let a = new_checkin_token();
        let b = new_checkin_token();
        assert_ne!(a, b);
        assert_eq!(decode_payload(&encode_payload(&a)).unwrap(), a);
    }
}

//! Base64 helpers shared by the envelope container and attachment data
//!
//! Both the encrypted container and the attachment bytes inside a tagged
//! payload travel as classic base64 (standard alphabet, with padding).
//! The URL-safe variant would break compatibility with already-stored
//! containers and with external tooling decoding the OpenSSL format.

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::error::{ErrorCategory, ErrorKind, OtsboxError, Result};

/// Encode bytes as standard base64 with padding
pub fn wrap(body: &[u8]) -> String {
    STANDARD.encode(body)
}

/// Decode standard base64 back into bytes
pub fn unwrap(encoded: &str) -> Result<Vec<u8>> {
    STANDARD.decode(encoded).map_err(|e| {
        OtsboxError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::Base64Decode,
            format!("base64 decoding failed: {}", e),
            e,
        )
    })
}

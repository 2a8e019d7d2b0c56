//! Core verification pipeline.
//!
//! Leaves first: [`decoder`] splits and decodes token segments,
//! [`key_material`] rebuilds RSA public keys from published components,
//! [`jwks`] fetches and indexes the issuer's key set, [`cache`] optionally
//! keeps that key set around, and [`verifier`] ties them together.

pub mod cache;
pub mod claims;
pub mod clock;
pub mod decoder;
pub mod jwks;
pub mod key_material;
pub mod verifier;

use jsonwebtoken::errors::ErrorKind;

/// Maximum length, in bytes, of an untrusted value echoed in a message.
const DISPLAY_LIMIT: usize = 128;

/// Make an untrusted string (a `kid` or `alg` from a token) safe to put
/// in an error message or log line.
///
/// Control characters (including ANSI escape sequences) become the
/// Unicode replacement character and the result is truncated to 128
/// bytes on a character boundary.
pub(crate) fn sanitize_for_display(value: &str) -> String {
    let clean: String = value
        .chars()
        .map(|c| if c.is_control() { '\u{FFFD}' } else { c })
        .collect();
    if clean.len() > DISPLAY_LIMIT {
        let end = clean.floor_char_boundary(DISPLAY_LIMIT);
        format!("{}...(truncated)", &clean[..end])
    } else {
        clean
    }
}

/// Map a `jsonwebtoken` error kind to a short reason that does not leak
/// library internals.
pub(crate) fn sanitize_jwt_error(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidToken => "invalid token structure",
        ErrorKind::InvalidSignature => "signature does not match the issuer key",
        ErrorKind::InvalidAlgorithm => "algorithm mismatch between token and issuer key",
        ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => "issuer key is not usable",
        ErrorKind::Base64(_) => "invalid base64url encoding",
        ErrorKind::Json(_) => "invalid JSON content",
        ErrorKind::Utf8(_) => "invalid UTF-8 content",
        _ => "unexpected validation error",
    }
}

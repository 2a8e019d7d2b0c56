//! Compact token decoding.
//!
//! Splits a raw token into its three segments, base64url-decodes them
//! and parses the header and claims as JSON. Nothing here checks a
//! signature: the values produced are untrusted.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::Value;

use crate::error::VerificationError;

/// The fields of a token header the verifier relies on.
///
/// Parsed before the signature is checked, so every value is
/// attacker-controlled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenHeader {
    /// Identifier of the key that (claims to have) signed the token.
    pub kid: String,
    /// Algorithm the token claims to be signed with.
    pub alg: String,
    /// Media type, usually `JWT`.
    #[serde(default)]
    pub typ: Option<String>,
}

/// The decoded parts of a token, for inspection only.
///
/// Implements a custom `Debug` that redacts `payload` and `signature`
/// to prevent accidental leakage of claim data.
pub struct DecodedToken {
    /// The parsed header.
    pub header: Value,
    /// The parsed claims.
    pub payload: Value,
    /// The raw base64url-encoded signature segment.
    pub signature: String,
}

impl fmt::Debug for DecodedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("header", &self.header)
            .field("payload", &"[REDACTED]")
            .field("signature", &"[REDACTED]")
            .finish()
    }
}

/// Split a token into exactly three dot-separated segments.
///
/// # Errors
///
/// Returns [`VerificationError::MalformedToken`] for any other count.
pub fn split_token(token: &str) -> Result<[&str; 3], VerificationError> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(claims), Some(signature), None) => Ok([header, claims, signature]),
        _ => Err(VerificationError::malformed_token(
            "expected 'header.payload.signature' structure",
        )),
    }
}

/// Decode only the header, requiring `kid` and `alg`.
///
/// # Errors
///
/// Returns [`VerificationError::MalformedToken`] if the token does not
/// have three segments, the header is not base64url JSON, or `kid` or
/// `alg` is missing.
pub fn decode_header(token: &str) -> Result<TokenHeader, VerificationError> {
    let [header, _, _] = split_token(token)?;
    let bytes = decode_base64(header, "header")?;
    serde_json::from_slice(&bytes).map_err(|e| {
        VerificationError::malformed_token(format!("failed to parse header: {}", header_reason(&e)))
    })
}

/// Decode a token into its constituent parts without verifying it.
///
/// # Errors
///
/// Returns [`VerificationError::MalformedToken`] if the token doesn't
/// have exactly three parts, or if base64url decoding or JSON parsing
/// of the header or payload fails.
pub fn decode_token(token: &str) -> Result<DecodedToken, VerificationError> {
    let [header, payload, signature] = split_token(token)?;

    Ok(DecodedToken {
        header: decode_segment(header, "header")?,
        payload: decode_segment(payload, "payload")?,
        signature: signature.to_string(),
    })
}

fn decode_base64(encoded: &str, segment: &str) -> Result<Vec<u8>, VerificationError> {
    URL_SAFE_NO_PAD.decode(encoded).map_err(|_| {
        VerificationError::malformed_token(format!(
            "failed to decode {segment}: invalid base64url encoding"
        ))
    })
}

fn decode_segment(encoded: &str, segment: &str) -> Result<Value, VerificationError> {
    let bytes = decode_base64(encoded, segment)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        VerificationError::malformed_token(format!("failed to parse {segment} as JSON: {e}"))
    })
}

/// Describe a header parse failure without quoting header content.
fn header_reason(err: &serde_json::Error) -> String {
    let message = err.to_string();
    if message.starts_with("missing field `kid`") {
        "missing 'kid'".to_string()
    } else if message.starts_with("missing field `alg`") {
        "missing 'alg'".to_string()
    } else if err.is_data() {
        "unexpected field types".to_string()
    } else {
        "not a JSON object".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b64(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn test_decoded_token_debug_redacts_sensitive_fields() {
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IlRlc3QgVXNlciIsImlhdCI6MTUxNjIzOTAyMn0.\
                     SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";
        let decoded = decode_token(token).unwrap();
        let debug_output = format!("{:?}", decoded);

        assert!(debug_output.contains("HS256"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("1234567890"));
        assert!(!debug_output.contains("SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c"));
    }

    #[test]
    fn test_decode_valid_token() {
        // Header: {"alg":"HS256","typ":"JWT"}
        // Payload: {"sub":"1234567890","name":"Test User","iat":1516239022}
        let token = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.\
                     eyJzdWIiOiIxMjM0NTY3ODkwIiwibmFtZSI6IlRlc3QgVXNlciIsImlhdCI6MTUxNjIzOTAyMn0.\
                     SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c";

        let decoded = decode_token(token).unwrap();

        assert_eq!(decoded.header["alg"], "HS256");
        assert_eq!(decoded.payload["sub"], "1234567890");
        assert_eq!(decoded.payload["iat"], 1516239022);
        assert_eq!(
            decoded.signature,
            "SflKxwRJSMeKKF2QT4fwpMeJf36POk6yJV_adQssw5c"
        );
    }

    #[test]
    fn test_split_token_rejects_wrong_segment_counts() {
        for token in ["", "one", "a.b", "a.b.c.d", "a.b.c.d.e"] {
            let err = split_token(token).unwrap_err();
            assert!(
                matches!(err, VerificationError::MalformedToken { .. }),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_split_token_accepts_empty_signature() {
        let [h, c, s] = split_token("a.b.").unwrap();
        assert_eq!((h, c, s), ("a", "b", ""));
    }

    #[test]
    fn test_decode_header_reads_kid_and_alg() {
        let token = format!(
            "{}.{}.sig",
            b64(r#"{"kid":"W6WcOKB","alg":"RS256","typ":"JWT"}"#),
            b64(r#"{"sub":"x"}"#)
        );
        let header = decode_header(&token).unwrap();
        assert_eq!(header.kid, "W6WcOKB");
        assert_eq!(header.alg, "RS256");
        assert_eq!(header.typ.as_deref(), Some("JWT"));
    }

    #[test]
    fn test_decode_header_missing_kid() {
        let token = format!("{}.e30.sig", b64(r#"{"alg":"RS256"}"#));
        let err = decode_header(&token).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::MalformedToken { reason } if reason.contains("missing 'kid'")
        ));
    }

    #[test]
    fn test_decode_header_missing_alg() {
        let token = format!("{}.e30.sig", b64(r#"{"kid":"k1"}"#));
        let err = decode_header(&token).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::MalformedToken { reason } if reason.contains("missing 'alg'")
        ));
    }

    #[test]
    fn test_decode_header_non_string_kid() {
        let token = format!("{}.e30.sig", b64(r#"{"kid":42,"alg":"RS256"}"#));
        let err = decode_header(&token).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedToken { .. }));
    }

    #[test]
    fn test_decode_header_invalid_base64() {
        let err = decode_header("!!!invalid!!!.e30.sig").unwrap_err();
        assert!(matches!(
            err,
            VerificationError::MalformedToken { reason } if reason.contains("base64url")
        ));
    }

    #[test]
    fn test_decode_token_invalid_json_payload_fails() {
        // base64url("not json") as payload
        let err = decode_token("eyJhbGciOiJIUzI1NiJ9.bm90IGpzb24.sig").unwrap_err();
        assert!(matches!(
            err,
            VerificationError::MalformedToken { reason } if reason.contains("payload")
        ));
    }

    #[test]
    fn test_decode_token_with_empty_payload_object() {
        // {"alg":"none"} . {} . (empty signature)
        let decoded = decode_token("eyJhbGciOiJub25lIn0.e30.").unwrap();
        assert_eq!(decoded.header["alg"], "none");
        assert!(decoded.payload.as_object().unwrap().is_empty());
        assert_eq!(decoded.signature, "");
    }
}

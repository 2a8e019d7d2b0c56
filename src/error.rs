//! Error types for identity-token verification.
//!
//! Every failure in the pipeline surfaces as a distinct
//! [`VerificationError`] variant. Messages never echo raw untrusted
//! input: key identifiers and algorithm names taken from a token are
//! sanitized before they are stored here.

use thiserror::Error;

/// Errors that can occur while fetching keys or verifying a token.
///
/// All variants are terminal for a single verification call. Only
/// [`VerificationError::KeySetUnavailable`] describes a transient
/// condition; see [`VerificationError::is_retryable`].
#[derive(Debug, Error)]
pub enum VerificationError {
    /// The token is not a well-formed compact signed token, or its
    /// header or claims could not be decoded.
    #[error("malformed token: {reason}")]
    MalformedToken {
        /// Description of the structural problem.
        reason: String,
    },

    /// The key descriptor's numeric components could not be turned into
    /// a public key.
    #[error("malformed key material: {reason}")]
    MalformedKeyMaterial {
        /// Description of what was wrong with the key descriptor.
        reason: String,
    },

    /// The key descriptor declares a key type this crate cannot use.
    #[error("unsupported key type '{kty}'")]
    UnsupportedKeyType {
        /// The `kty` value from the descriptor.
        kty: String,
    },

    /// The key descriptor declares an algorithm that is not an RSA
    /// signature algorithm.
    #[error("unsupported algorithm '{algorithm}'")]
    UnsupportedAlgorithm {
        /// The `alg` value from the descriptor.
        algorithm: String,
    },

    /// The configured key-set endpoint is not an acceptable URL.
    #[error("invalid key-set URL '{url}': {reason}")]
    InvalidKeySetUrl {
        /// The endpoint, stripped of credentials, query and fragment.
        url: String,
        /// Why the URL was rejected.
        reason: String,
    },

    /// The key-set document could not be retrieved or parsed.
    #[error("key set at '{url}' is unavailable: {reason}")]
    KeySetUnavailable {
        /// The endpoint, stripped of credentials, query and fragment.
        url: String,
        /// Description of the fetch failure.
        reason: String,
    },

    /// The key-set document contains no usable keys.
    #[error("key set at '{url}' contains no keys")]
    KeySetEmpty {
        /// The endpoint, stripped of credentials, query and fragment.
        url: String,
    },

    /// No key in the key set carries the token's key identifier.
    #[error("no key found in key set for kid '{kid}'")]
    KeyNotFound {
        /// The (sanitized) key identifier from the token header.
        kid: String,
    },

    /// The token's signature does not verify under the issuer's key.
    #[error("signature validation failed: {reason}")]
    SignatureInvalid {
        /// Description of why validation failed.
        reason: String,
    },

    /// The token's `exp` claim lies in the past.
    #[error("token expired at {expired_at} (unix seconds)")]
    TokenExpired {
        /// The `exp` claim value.
        expired_at: i64,
    },

    /// The token's `nbf` or `iat` claim lies in the future.
    #[error("token is not valid before {valid_from} (unix seconds, '{claim}' claim)")]
    TokenNotYetValid {
        /// Which claim triggered the rejection (`nbf` or `iat`).
        claim: &'static str,
        /// The claim value.
        valid_from: i64,
    },

    /// A payload was constructed from an absent or empty claim set.
    #[error("payload received no claims")]
    NullPayload,
}

impl VerificationError {
    /// Whether the caller may safely retry the same token later.
    ///
    /// Only a failed key-set fetch qualifies. Every other variant means
    /// the token (or the issuer's key) is untrusted and retrying would
    /// give the same answer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VerificationError::KeySetUnavailable { .. })
    }

    pub(crate) fn malformed_token(reason: impl Into<String>) -> Self {
        VerificationError::MalformedToken {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_key(reason: impl Into<String>) -> Self {
        VerificationError::MalformedKeyMaterial {
            reason: reason.into(),
        }
    }
}

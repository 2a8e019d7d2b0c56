//! Verification of Sign in with Apple identity tokens.
//!
//! An identity token is a compact signed token whose header names the
//! signing key by `kid`. Verification fetches the issuer's published key
//! set, rebuilds the named RSA key from its modulus and exponent, checks
//! the signature with the algorithm the issuer declared for that key,
//! checks `exp`/`nbf`/`iat`, and hands back the claims.
//!
//! ```no_run
//! # fn main() -> Result<(), apple_signin::VerificationError> {
//! let payload = apple_signin::verify_identity_token("eyJraWQiOi...")?;
//! if payload.verify_user("001234.5f0e3c1a9b2d4e6f.0123") {
//!     println!("signed in as {:?}", payload.get_email());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The free functions use [`VerifierConfig::default`]. Build a
//! [`TokenVerifier`] to change the endpoint, timeout, clock skew or
//! caching, or to supply your own transport.

#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod error;
pub mod payload;

pub use crate::config::VerifierConfig;
pub use crate::core::cache::CachedKeySet;
pub use crate::core::claims::VerifiedClaims;
pub use crate::core::clock::{Clock, FixedClock, SystemClock};
pub use crate::core::jwks::{
    HttpClient, HttpResponse, KeyDescriptor, KeyResolver, KeySetClient, KeySetDocument,
    ReqwestHttpClient, TransportError,
};
pub use crate::core::key_material::{KeyMaterial, PublicKey, build_public_key};
pub use crate::core::verifier::TokenVerifier;
pub use crate::error::VerificationError;
pub use crate::payload::Payload;

/// Verify an identity token against Apple's published keys.
///
/// # Errors
///
/// Any [`VerificationError`]; see [`TokenVerifier::verify_payload`].
pub fn verify_identity_token(token: &str) -> Result<Payload, VerificationError> {
    TokenVerifier::new(VerifierConfig::default())?.verify_payload(token)
}

/// Verify an identity token and return its raw claims.
///
/// # Errors
///
/// Any [`VerificationError`] except `NullPayload`.
pub fn decode_identity_token(token: &str) -> Result<VerifiedClaims, VerificationError> {
    TokenVerifier::new(VerifierConfig::default())?.verify(token)
}

/// Fetch and rebuild the Apple signing key named `kid`.
///
/// # Errors
///
/// Key-set fetch failures, [`VerificationError::KeyNotFound`], and key
/// reconstruction failures.
pub fn fetch_public_key(kid: &str) -> Result<KeyMaterial, VerificationError> {
    TokenVerifier::new(VerifierConfig::default())?.fetch_public_key(kid)
}

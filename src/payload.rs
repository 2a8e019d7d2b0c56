//! Convenience access to verified identity-token claims.

use std::fmt;

use serde_json::{Map, Value};

use crate::core::claims::VerifiedClaims;
use crate::error::VerificationError;

/// The claims of a verified identity token.
///
/// Built only from [`VerifiedClaims`], so every `Payload` started life
/// as a verified token. [`Payload::set`] and [`Payload::remove`] change
/// this local copy only.
#[derive(Clone, PartialEq)]
pub struct Payload {
    claims: Map<String, Value>,
}

impl Payload {
    /// Wrap verified claims.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::NullPayload`] if the token carried
    /// no claims at all.
    pub fn new(claims: VerifiedClaims) -> Result<Self, VerificationError> {
        if claims.is_empty() {
            return Err(VerificationError::NullPayload);
        }
        Ok(Self {
            claims: claims.into_map(),
        })
    }

    /// The stable user identifier (`sub`).
    pub fn get_user(&self) -> Option<&str> {
        self.get_str("sub")
    }

    pub fn get_email(&self) -> Option<&str> {
        self.get_str("email")
    }

    /// Whether `candidate` is exactly this token's subject.
    ///
    /// Case-sensitive; `false` when the token has no string `sub`.
    pub fn verify_user(&self, candidate: &str) -> bool {
        self.get_user() == Some(candidate)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    /// Set a claim, returning the value it replaced.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.claims.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.claims.remove(key)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn into_claims(self) -> Map<String, Value> {
        self.claims
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.claims.get(key).and_then(Value::as_str)
    }
}

impl TryFrom<Option<VerifiedClaims>> for Payload {
    type Error = VerificationError;

    fn try_from(claims: Option<VerifiedClaims>) -> Result<Self, Self::Error> {
        claims.map_or(Err(VerificationError::NullPayload), Self::new)
    }
}

/// Lists claim names but never values.
impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("claims", &self.claims.keys().collect::<Vec<_>>())
            .finish()
    }
}

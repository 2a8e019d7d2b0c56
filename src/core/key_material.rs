//! Public-key reconstruction from published key descriptors.
//!
//! An issuer publishes each RSA key as a base64url modulus `n` and
//! exponent `e`. This module turns those components back into an
//! [`rsa::RsaPublicKey`] and binds it to the signature algorithm the
//! issuer declared for it.

use std::fmt;

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use jsonwebtoken::{Algorithm, DecodingKey};
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::core::jwks::KeyDescriptor;
use crate::core::sanitize_for_display;
use crate::error::VerificationError;

/// Key components are published unpadded, but tolerate padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Smallest RSA modulus accepted from a key set.
const MIN_MODULUS_BITS: usize = 2048;

/// An RSA public key rebuilt from a key descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// The underlying `rsa` crate key.
    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.inner
    }

    /// Size of the modulus in bits.
    pub fn modulus_bits(&self) -> usize {
        self.inner.n().bits()
    }

    /// RFC 7638 thumbprint: SHA-256 over the canonical
    /// `{"e","kty","n"}` JSON, base64url-encoded without padding.
    pub fn thumbprint(&self) -> String {
        let n = URL_SAFE_NO_PAD.encode(self.inner.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(self.inner.e().to_bytes_be());
        let canonical = format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#);
        URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
    }

    /// SubjectPublicKeyInfo PEM encoding of the key.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::MalformedKeyMaterial`] if the key
    /// cannot be DER-encoded.
    pub fn to_pem(&self) -> Result<String, VerificationError> {
        self.inner
            .to_public_key_pem(LineEnding::LF)
            .map_err(|_| VerificationError::malformed_key("failed to encode public key as PEM"))
    }

    /// A `jsonwebtoken` verification key for this public key.
    pub fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_rsa_raw_components(
            &self.inner.n().to_bytes_be(),
            &self.inner.e().to_bytes_be(),
        )
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("kty", &"RSA")
            .field("bits", &self.modulus_bits())
            .field("thumbprint", &self.thumbprint())
            .finish()
    }
}

/// A public key together with the algorithm its issuer bound it to.
#[derive(Debug, Clone)]
pub struct KeyMaterial {
    /// Identifier of the key in the issuer's key set.
    pub kid: String,
    /// Signature algorithm declared by the issuer for this key.
    pub algorithm: Algorithm,
    /// The reconstructed public key.
    pub public_key: PublicKey,
}

impl KeyMaterial {
    /// Rebuild the public key and resolve the declared algorithm.
    ///
    /// # Errors
    ///
    /// Everything [`build_public_key`] returns, plus
    /// [`VerificationError::MalformedKeyMaterial`] if the descriptor has
    /// no `alg` and [`VerificationError::UnsupportedAlgorithm`] if `alg`
    /// is not an RSA signature algorithm.
    pub fn from_descriptor(descriptor: &KeyDescriptor) -> Result<Self, VerificationError> {
        let public_key = build_public_key(descriptor)?;
        let alg = descriptor
            .alg
            .as_deref()
            .ok_or_else(|| VerificationError::malformed_key("key does not declare an algorithm"))?;
        let algorithm = rsa_signature_algorithm(alg)?;

        Ok(Self {
            kid: descriptor.kid.clone(),
            algorithm,
            public_key,
        })
    }
}

/// Turn an RSA key descriptor into a [`PublicKey`].
///
/// # Errors
///
/// Returns [`VerificationError::UnsupportedKeyType`] if `kty` is not
/// `RSA`, and [`VerificationError::MalformedKeyMaterial`] if `n` or `e`
/// is absent, empty, not base64url, or does not form a valid RSA key.
pub fn build_public_key(descriptor: &KeyDescriptor) -> Result<PublicKey, VerificationError> {
    if descriptor.kty != "RSA" {
        return Err(VerificationError::UnsupportedKeyType {
            kty: sanitize_for_display(&descriptor.kty),
        });
    }

    let n = decode_component(descriptor.n.as_deref(), "n")?;
    let e = decode_component(descriptor.e.as_deref(), "e")?;

    let inner = RsaPublicKey::new(BigUint::from_bytes_be(&n), BigUint::from_bytes_be(&e))
        .map_err(|err| VerificationError::malformed_key(format!("invalid RSA key: {err}")))?;

    let key = PublicKey { inner };
    if key.modulus_bits() < MIN_MODULUS_BITS {
        return Err(VerificationError::malformed_key(format!(
            "RSA modulus is {} bits, at least {MIN_MODULUS_BITS} required",
            key.modulus_bits()
        )));
    }
    Ok(key)
}

fn decode_component(value: Option<&str>, name: &str) -> Result<Vec<u8>, VerificationError> {
    let encoded = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| VerificationError::malformed_key(format!("'{name}' is missing or empty")))?;
    let bytes = URL_SAFE_LENIENT.decode(encoded).map_err(|_| {
        VerificationError::malformed_key(format!("'{name}' is not valid base64url"))
    })?;
    if bytes.iter().all(|&b| b == 0) {
        return Err(VerificationError::malformed_key(format!("'{name}' is zero")));
    }
    Ok(bytes)
}

/// Map a declared `alg` onto the RSA signature algorithms.
///
/// Encryption algorithms (`RSA-OAEP` and friends), HMAC and EC
/// algorithms are rejected: an RSA key must never be used to check an
/// HMAC or EC signature.
fn rsa_signature_algorithm(alg: &str) -> Result<Algorithm, VerificationError> {
    match alg {
        "RS256" => Ok(Algorithm::RS256),
        "RS384" => Ok(Algorithm::RS384),
        "RS512" => Ok(Algorithm::RS512),
        "PS256" => Ok(Algorithm::PS256),
        "PS384" => Ok(Algorithm::PS384),
        "PS512" => Ok(Algorithm::PS512),
        other => Err(VerificationError::UnsupportedAlgorithm {
            algorithm: sanitize_for_display(other),
        }),
    }
}

//! Identity-token verification.
//!
//! Parses the untrusted header, resolves the issuer key named by its
//! `kid`, binds verification to the algorithm the issuer declared for
//! that key, checks the signature, and finally checks the time-based
//! claims.

use std::collections::HashSet;
use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode};
use serde_json::{Map, Value};

use crate::config::VerifierConfig;
use crate::core::cache::CachedKeySet;
use crate::core::claims::VerifiedClaims;
use crate::core::clock::{Clock, SystemClock};
use crate::core::decoder::{self, TokenHeader};
use crate::core::jwks::{HttpClient, KeyResolver, KeySetClient};
use crate::core::key_material::KeyMaterial;
use crate::core::{sanitize_for_display, sanitize_jwt_error};
use crate::error::VerificationError;
use crate::payload::Payload;

/// Verifies identity tokens against an issuer's published keys.
///
/// Holds only configuration and its collaborators; verification calls
/// share no mutable state and may run concurrently.
#[derive(Clone)]
pub struct TokenVerifier {
    resolver: Arc<dyn KeyResolver>,
    clock: Arc<dyn Clock>,
    clock_skew_seconds: u64,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    /// Build a verifier that fetches keys over HTTPS with `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::InvalidKeySetUrl`] if the configured
    /// URL is unacceptable, or [`VerificationError::KeySetUnavailable`]
    /// if the HTTP client cannot be built.
    pub fn new(config: VerifierConfig) -> Result<Self, VerificationError> {
        let client = KeySetClient::from_config(&config)?;
        Ok(Self::from_client(client, &config))
    }

    /// Build a verifier that fetches keys over a caller-supplied transport.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::InvalidKeySetUrl`] if the configured
    /// URL is unacceptable.
    pub fn with_http_client(
        config: VerifierConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<Self, VerificationError> {
        let client = KeySetClient::new(&config.key_set_url, http)?;
        Ok(Self::from_client(client, &config))
    }

    /// Build a verifier over any key source.
    pub fn with_resolver(resolver: Arc<dyn KeyResolver>, clock_skew_seconds: u64) -> Self {
        Self {
            resolver,
            clock: Arc::new(SystemClock),
            clock_skew_seconds,
        }
    }

    /// Evaluate time-based claims against `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    fn from_client(client: KeySetClient, config: &VerifierConfig) -> Self {
        let resolver: Arc<dyn KeyResolver> = match config.cache_ttl {
            Some(ttl) => Arc::new(
                CachedKeySet::new(client, ttl).with_refetch_cooldown(config.refetch_cooldown),
            ),
            None => Arc::new(client),
        };
        Self::with_resolver(resolver, config.clock_skew_seconds)
    }

    /// Verify `token` and return its claims.
    ///
    /// Structural problems are reported before any key is fetched, and
    /// an unknown `kid` is reported before any signature work.
    ///
    /// # Errors
    ///
    /// Any [`VerificationError`] except `NullPayload`.
    pub fn verify(&self, token: &str) -> Result<VerifiedClaims, VerificationError> {
        self.verify_inner(token).inspect_err(|e| {
            tracing::warn!(error = %e, retryable = e.is_retryable(), "identity token rejected");
        })
    }

    fn verify_inner(&self, token: &str) -> Result<VerifiedClaims, VerificationError> {
        let header = decoder::decode_header(token)?;
        tracing::debug!(kid = %sanitize_for_display(&header.kid), "resolving issuer key");

        let descriptor = self.resolver.resolve(&header.kid)?;
        let material = KeyMaterial::from_descriptor(&descriptor)?;
        let claims = verify_signature(token, &header, &material)?;

        check_time_claims(&claims, self.clock.now().timestamp(), self.clock_skew_seconds)?;

        tracing::debug!(kid = %material.kid, alg = ?material.algorithm, "identity token verified");
        Ok(VerifiedClaims::new(claims))
    }

    /// Verify `token` and wrap its claims in a [`Payload`].
    ///
    /// # Errors
    ///
    /// Everything [`TokenVerifier::verify`] returns, plus
    /// [`VerificationError::NullPayload`] if the token carries no claims.
    pub fn verify_payload(&self, token: &str) -> Result<Payload, VerificationError> {
        Payload::new(self.verify(token)?)
    }

    /// Fetch the issuer key named `kid` and rebuild it.
    ///
    /// # Errors
    ///
    /// Key-set fetch and lookup failures, and everything
    /// [`KeyMaterial::from_descriptor`] returns.
    pub fn fetch_public_key(&self, kid: &str) -> Result<KeyMaterial, VerificationError> {
        let descriptor = self.resolver.resolve(kid)?;
        KeyMaterial::from_descriptor(&descriptor)
    }
}

/// Check the signature with the issuer-declared algorithm.
///
/// The header's `alg` must name exactly that algorithm; anything else is
/// rejected before the signature is touched, so a token cannot pick its
/// own verification algorithm.
fn verify_signature(
    token: &str,
    header: &TokenHeader,
    material: &KeyMaterial,
) -> Result<Map<String, Value>, VerificationError> {
    match header.alg.parse::<Algorithm>() {
        Ok(alg) if alg == material.algorithm => {}
        _ => {
            return Err(VerificationError::SignatureInvalid {
                reason: format!(
                    "token algorithm '{}' does not match issuer key algorithm '{:?}'",
                    sanitize_for_display(&header.alg),
                    material.algorithm
                ),
            });
        }
    }

    let mut validation = Validation::new(material.algorithm);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<Map<String, Value>>(token, &material.public_key.decoding_key(), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            let reason = sanitize_jwt_error(e.kind()).to_string();
            match e.kind() {
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => VerificationError::MalformedToken { reason },
                ErrorKind::InvalidRsaKey(_) | ErrorKind::InvalidKeyFormat => {
                    VerificationError::MalformedKeyMaterial { reason }
                }
                _ => VerificationError::SignatureInvalid { reason },
            }
        })
}

/// Check `exp`, `nbf` and `iat` against `now`, allowing `skew` seconds.
///
/// Absent claims are not checked. A token is expired once
/// `now >= exp + skew`.
fn check_time_claims(
    claims: &Map<String, Value>,
    now: i64,
    skew: u64,
) -> Result<(), VerificationError> {
    let skew = i64::try_from(skew).unwrap_or(i64::MAX);

    if let Some(exp) = numeric_date(claims, "exp")?
        && now >= exp.saturating_add(skew)
    {
        return Err(VerificationError::TokenExpired { expired_at: exp });
    }

    if let Some(nbf) = numeric_date(claims, "nbf")?
        && now.saturating_add(skew) < nbf
    {
        return Err(VerificationError::TokenNotYetValid {
            claim: "nbf",
            valid_from: nbf,
        });
    }

    if let Some(iat) = numeric_date(claims, "iat")?
        && iat > now.saturating_add(skew)
    {
        return Err(VerificationError::TokenNotYetValid {
            claim: "iat",
            valid_from: iat,
        });
    }

    Ok(())
}

/// Read a NumericDate claim as whole seconds.
fn numeric_date(
    claims: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<i64>, VerificationError> {
    let Some(value) = claims.get(name) else {
        return Ok(None);
    };

    let seconds = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.floor() as i64)),
        _ => None,
    };

    seconds
        .map(Some)
        .ok_or_else(|| VerificationError::malformed_token(format!("claim '{name}' is not a numeric date")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::jwks::KeyDescriptor;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/rsa_private.pem");
    const MODULUS: &str = "v4ngrrsczKptCIC0MTwyLWEsxnG-tNHpn51M68fU9g7COhqddOXJGsGxiShnZ-jlgr9HDUEfH9fyuuH0QH2sly0X_VONyHqDJNApjpXwmBSvgzEulC_9q7XdEOcT4XY5nhIt3tUmSVEBrgA9bvhx2A_8pW7l3mYb-xCRFEPHkHjmURADVUobzliRIOCWaMoQfwF09IEuUi6749IglmGI4FRTVndMBunU8NS5OHHntHux49Wccw8uxdvChaBF1PXGuMrf7IxCMJqevVkigTjdd3ZmqG0B06Uo7iaHSpfKsx0TBlhaeGPkomRG9rR1UdKjfLgMjBnvsIGA8UeVepWaYQ";
    const NOW: i64 = 1_700_000_000;

    /// Resolves every `kid` in its list to the fixture key and counts calls.
    struct FixtureResolver {
        kids: Vec<&'static str>,
        alg: &'static str,
        calls: AtomicUsize,
    }

    impl KeyResolver for FixtureResolver {
        fn resolve(&self, kid: &str) -> Result<KeyDescriptor, VerificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.kids.contains(&kid) {
                return Err(VerificationError::KeyNotFound {
                    kid: kid.to_string(),
                });
            }
            Ok(KeyDescriptor {
                kid: kid.to_string(),
                kty: "RSA".to_string(),
                alg: Some(self.alg.to_string()),
                key_use: Some("sig".to_string()),
                n: Some(MODULUS.to_string()),
                e: Some("AQAB".to_string()),
            })
        }
    }

    fn resolver(alg: &'static str) -> Arc<FixtureResolver> {
        Arc::new(FixtureResolver {
            kids: vec!["k1"],
            alg,
            calls: AtomicUsize::new(0),
        })
    }

    fn verifier(resolver: Arc<FixtureResolver>, skew: u64) -> TokenVerifier {
        TokenVerifier::with_resolver(resolver, skew).with_clock(FixedClock::from_unix(NOW).unwrap())
    }

    fn sign(alg: Algorithm, kid: &str, claims: &Value) -> String {
        let mut header = Header::new(alg);
        header.kid = Some(kid.to_string());
        let key = EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap();
        encode(&header, claims, &key).unwrap()
    }

    fn claims_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test claims must be an object"),
        }
    }

    // --- Pipeline ---

    #[test]
    fn test_verify_round_trips_claims() {
        let claims = json!({"sub": "001234.abcd", "email": "a@privaterelay.appleid.com", "exp": NOW + 600});
        let token = sign(Algorithm::RS256, "k1", &claims);
        let verified = verifier(resolver("RS256"), 0).verify(&token).unwrap();
        assert_eq!(verified.as_map(), &claims_map(claims));
    }

    #[test]
    fn test_verify_ps256_key() {
        let token = sign(Algorithm::PS256, "k1", &json!({"sub": "x"}));
        assert!(verifier(resolver("PS256"), 0).verify(&token).is_ok());
    }

    #[test]
    fn test_malformed_token_never_reaches_resolver() {
        let keys = resolver("RS256");
        let v = verifier(Arc::clone(&keys), 0);
        for token in ["", "a.b", "a.b.c.d", "!!.e30.sig"] {
            let err = v.verify(token).unwrap_err();
            assert!(matches!(err, VerificationError::MalformedToken { .. }));
        }
        assert_eq!(keys.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_kid_is_key_not_found() {
        let token = sign(Algorithm::RS256, "rotated-away", &json!({"sub": "x"}));
        let err = verifier(resolver("RS256"), 0).verify(&token).unwrap_err();
        assert!(matches!(err, VerificationError::KeyNotFound { kid } if kid == "rotated-away"));
    }

    #[test]
    fn test_header_algorithm_must_match_issuer_algorithm() {
        // Token signed RS512 while the issuer declares RS256 for the key.
        let token = sign(Algorithm::RS512, "k1", &json!({"sub": "x"}));
        let err = verifier(resolver("RS256"), 0).verify(&token).unwrap_err();
        assert!(matches!(
            err,
            VerificationError::SignatureInvalid { reason } if reason.contains("does not match")
        ));
    }

    #[test]
    fn test_hmac_header_cannot_downgrade_rsa_key() {
        // alg confusion: an HS256 token "signed" with the public modulus.
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some("k1".to_string());
        let token = encode(
            &header,
            &json!({"sub": "attacker"}),
            &EncodingKey::from_secret(MODULUS.as_bytes()),
        )
        .unwrap();
        let err = verifier(resolver("RS256"), 0).verify(&token).unwrap_err();
        assert!(matches!(err, VerificationError::SignatureInvalid { .. }));
    }

    #[test]
    fn test_issuer_declaring_hmac_is_unsupported() {
        let token = sign(Algorithm::RS256, "k1", &json!({"sub": "x"}));
        let err = verifier(resolver("HS256"), 0).verify(&token).unwrap_err();
        assert!(matches!(err, VerificationError::UnsupportedAlgorithm { algorithm } if algorithm == "HS256"));
    }

    #[test]
    fn test_expired_token_rejected_after_signature_check() {
        let token = sign(Algorithm::RS256, "k1", &json!({"sub": "x", "exp": NOW - 1}));
        let err = verifier(resolver("RS256"), 0).verify(&token).unwrap_err();
        assert!(matches!(err, VerificationError::TokenExpired { expired_at } if expired_at == NOW - 1));
    }

    #[test]
    fn test_clock_skew_tolerates_recent_expiry() {
        let token = sign(Algorithm::RS256, "k1", &json!({"sub": "x", "exp": NOW - 10}));
        assert!(verifier(resolver("RS256"), 30).verify(&token).is_ok());
    }

    #[test]
    fn test_verify_payload_rejects_empty_claims() {
        let token = sign(Algorithm::RS256, "k1", &json!({}));
        let err = verifier(resolver("RS256"), 0).verify_payload(&token).unwrap_err();
        assert!(matches!(err, VerificationError::NullPayload));
    }

    #[test]
    fn test_fetch_public_key_binds_algorithm() {
        let material = verifier(resolver("RS256"), 0).fetch_public_key("k1").unwrap();
        assert_eq!(material.algorithm, Algorithm::RS256);
        assert_eq!(material.public_key.modulus_bits(), 2048);
    }

    #[test]
    fn test_verifier_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TokenVerifier>();
    }

    // --- Time claims ---

    #[test]
    fn test_time_claims_absent_pass() {
        assert!(check_time_claims(&claims_map(json!({"sub": "x"})), NOW, 0).is_ok());
    }

    #[test]
    fn test_exp_boundary() {
        let at_now = claims_map(json!({"exp": NOW}));
        assert!(matches!(
            check_time_claims(&at_now, NOW, 0),
            Err(VerificationError::TokenExpired { .. })
        ));
        let next_second = claims_map(json!({"exp": NOW + 1}));
        assert!(check_time_claims(&next_second, NOW, 0).is_ok());
    }

    #[test]
    fn test_nbf_in_future() {
        let claims = claims_map(json!({"nbf": NOW + 60}));
        assert!(matches!(
            check_time_claims(&claims, NOW, 0),
            Err(VerificationError::TokenNotYetValid { claim: "nbf", .. })
        ));
        assert!(check_time_claims(&claims, NOW, 60).is_ok());
    }

    #[test]
    fn test_iat_in_future() {
        let claims = claims_map(json!({"iat": NOW + 5}));
        assert!(matches!(
            check_time_claims(&claims, NOW, 0),
            Err(VerificationError::TokenNotYetValid { claim: "iat", .. })
        ));
        assert!(check_time_claims(&claims, NOW, 5).is_ok());
    }

    #[test]
    fn test_fractional_numeric_dates() {
        let claims = claims_map(json!({"exp": (NOW as f64) + 0.5}));
        // floor(NOW + 0.5) == NOW, so the token counts as expired.
        assert!(check_time_claims(&claims, NOW, 0).is_err());
    }

    #[test]
    fn test_non_numeric_time_claim_is_malformed() {
        let claims = claims_map(json!({"exp": "tomorrow"}));
        assert!(matches!(
            check_time_claims(&claims, NOW, 0),
            Err(VerificationError::MalformedToken { reason }) if reason.contains("'exp'")
        ));
    }

    #[test]
    fn test_huge_skew_does_not_overflow() {
        let claims = claims_map(json!({"exp": NOW - 100, "nbf": NOW + 100}));
        assert!(check_time_claims(&claims, NOW, u64::MAX).is_ok());
    }
}

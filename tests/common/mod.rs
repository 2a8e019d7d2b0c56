//! Shared test fixtures and helper utilities.
//!
//! Provides fixture RSA keys with their published components, token
//! signing helpers, key-set documents, and an in-memory transport.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use apple_signin::{HttpClient, HttpResponse, TransportError};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};

/// Path to the test RSA private key fixture.
pub const RSA_PRIVATE_KEY_PATH: &str = "tests/fixtures/rsa_private.pem";

/// Path to a second, unrelated RSA private key fixture.
pub const RSA_OTHER_PRIVATE_KEY_PATH: &str = "tests/fixtures/rsa_other_private.pem";

/// Modulus of [`RSA_PRIVATE_KEY_PATH`], base64url.
pub const RSA_MODULUS: &str = "v4ngrrsczKptCIC0MTwyLWEsxnG-tNHpn51M68fU9g7COhqddOXJGsGxiShnZ-jlgr9HDUEfH9fyuuH0QH2sly0X_VONyHqDJNApjpXwmBSvgzEulC_9q7XdEOcT4XY5nhIt3tUmSVEBrgA9bvhx2A_8pW7l3mYb-xCRFEPHkHjmURADVUobzliRIOCWaMoQfwF09IEuUi6749IglmGI4FRTVndMBunU8NS5OHHntHux49Wccw8uxdvChaBF1PXGuMrf7IxCMJqevVkigTjdd3ZmqG0B06Uo7iaHSpfKsx0TBlhaeGPkomRG9rR1UdKjfLgMjBnvsIGA8UeVepWaYQ";

/// RFC 7638 thumbprint of [`RSA_MODULUS`] with exponent `AQAB`.
pub const RSA_THUMBPRINT: &str = "kh_pOESrO3uvkXp4llSbbndGElFW3T6YQ3klmXkXcSk";

/// Modulus of [`RSA_OTHER_PRIVATE_KEY_PATH`], base64url.
pub const RSA_OTHER_MODULUS: &str = "3MJhYDBMv3SOiQ3EH4nuHmJ0fuq99USGWbD_wrnhVYlZ_ia6jjz1Pdm-DsbW2-W7c4_J9h-T5sYUeaUrrGgy_190wYKYIolONXTFSWfA81hi4Eh3TjUyH8AulQgFhO3W67u8jCaeRakVh4xZggGtfNu9nkCtRQfzgVfZmjMR8cBRVFqvPd82uKnrqIWZT7Lvhe9tQggLnGmEAxYS24MJHTtLA-Bkl81N3v9hfdG_hRUnFGUYQfA7TsNSn6KY9rZn63liWmNih45WfshR2x7Lviv-myhxZtTXvUy7yiOPADsYu_6Ht-fNMPN22zDVmnx3GN9uB_mXXbKO1QM8eKmW-Q";

/// Public exponent 65537, base64url.
pub const RSA_EXPONENT: &str = "AQAB";

/// Key ID under which [`RSA_MODULUS`] is published.
pub const KID: &str = "W6WcOKB";

/// Key ID under which [`RSA_OTHER_MODULUS`] is published.
pub const OTHER_KID: &str = "fh6Bs8C";

/// Subject used in [`apple_claims`].
pub const SUBJECT: &str = "001234.5f0e3c1a9b2d4e6f8a0b1c2d3e4f5a6b.0123";

/// Sign `claims` with the private key at `key_path`, setting `kid`.
pub fn sign_token(alg: Algorithm, kid: &str, claims: &Value, key_path: &str) -> String {
    let private_key = std::fs::read(key_path).unwrap();
    let mut header = Header::new(alg);
    header.kid = Some(kid.to_string());
    let key = EncodingKey::from_rsa_pem(&private_key).unwrap();
    encode(&header, claims, &key).unwrap()
}

/// An RS256 token signed with the primary fixture key under [`KID`].
pub fn create_rs256_token(claims: &Value) -> String {
    sign_token(Algorithm::RS256, KID, claims, RSA_PRIVATE_KEY_PATH)
}

/// Claims shaped like a Sign in with Apple identity token, valid for
/// ten minutes around `now`.
pub fn apple_claims(now: i64) -> Value {
    json!({
        "iss": "https://appleid.apple.com",
        "aud": "com.example.app",
        "exp": now + 600,
        "iat": now - 5,
        "sub": SUBJECT,
        "c_hash": "fX4KGQF1pBe6KQ2F9hn2tg",
        "email": "xyz@privaterelay.appleid.com",
        "email_verified": true,
        "is_private_email": true,
        "auth_time": now - 5,
        "nonce_supported": true
    })
}

/// The current Unix time in seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// A published key entry for `n` with exponent `AQAB`.
pub fn key_entry(kid: &str, alg: &str, n: &str) -> Value {
    json!({
        "kty": "RSA",
        "kid": kid,
        "use": "sig",
        "alg": alg,
        "n": n,
        "e": RSA_EXPONENT
    })
}

/// A key set publishing both fixture keys for RS256.
pub fn fixture_key_set() -> Value {
    json!({
        "keys": [
            key_entry(OTHER_KID, "RS256", RSA_OTHER_MODULUS),
            key_entry(KID, "RS256", RSA_MODULUS),
        ]
    })
}

/// Serves a fixed response and counts requests.
pub struct StaticHttp {
    status: u16,
    body: Vec<u8>,
    calls: AtomicUsize,
}

impl StaticHttp {
    pub fn json(body: &Value) -> Arc<Self> {
        Self::with_status(200, body.to_string())
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for StaticHttp {
    fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Fails every request as a network error would.
pub struct UnreachableHttp;

impl HttpClient for UnreachableHttp {
    fn get(&self, _url: &str) -> Result<HttpResponse, TransportError> {
        Err(TransportError::new("connection refused"))
    }
}

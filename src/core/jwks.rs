//! Key-set (JWKS) fetching and key lookup.
//!
//! Fetches the issuer's published key-set document over an injectable
//! [`HttpClient`], parses it, and finds the key matching a token's `kid`.
//! No caching happens here; see [`crate::core::cache`] for that.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::VerifierConfig;
use crate::core::sanitize_for_display;
use crate::error::VerificationError;

/// One published key, as it appears in the key-set document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDescriptor {
    /// Key identifier, unique within the document.
    pub kid: String,
    /// Key type, e.g. `RSA`.
    pub kty: String,
    /// Signature algorithm the issuer uses with this key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    /// Intended use, `sig` for signing keys.
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    /// RSA modulus, base64url big-endian.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// RSA public exponent, base64url big-endian.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

/// A parsed key-set document. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySetDocument {
    keys: Vec<KeyDescriptor>,
}

/// Wire shape of the document before entries are validated.
#[derive(Deserialize)]
struct RawKeySet {
    #[serde(default)]
    keys: Option<Vec<Value>>,
}

impl KeySetDocument {
    /// Parse a key-set document body.
    ///
    /// Entries that are not key descriptors (no `kid` or `kty`, wrong
    /// field types) are skipped with a warning; one bad entry does not
    /// poison the rest of the set.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeySetUnavailable`] if the body is not
    /// a JSON object with an array `keys` field, and
    /// [`VerificationError::KeySetEmpty`] if `keys` is missing or holds no
    /// usable entries.
    pub fn from_slice(body: &[u8], display_url: &str) -> Result<Self, VerificationError> {
        let raw: RawKeySet =
            serde_json::from_slice(body).map_err(|_| VerificationError::KeySetUnavailable {
                url: display_url.to_string(),
                reason: "response is not a valid key-set document".to_string(),
            })?;

        let keys: Vec<KeyDescriptor> = raw
            .keys
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::warn!(index, error = %e, "skipping unusable key-set entry");
                    None
                }
            })
            .collect();

        if keys.is_empty() {
            return Err(VerificationError::KeySetEmpty {
                url: display_url.to_string(),
            });
        }

        Ok(Self { keys })
    }

    /// All descriptors, in document order.
    pub fn keys(&self) -> &[KeyDescriptor] {
        &self.keys
    }

    /// Find the descriptor whose `kid` exactly matches.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeyNotFound`] if no descriptor matches.
    pub fn find_by_kid(&self, kid: &str) -> Result<&KeyDescriptor, VerificationError> {
        self.keys
            .iter()
            .find(|key| key.kid == kid)
            .ok_or_else(|| VerificationError::KeyNotFound {
                kid: sanitize_for_display(kid),
            })
    }

    pub(crate) fn contains(&self, kid: &str) -> bool {
        self.keys.iter().any(|key| key.kid == kid)
    }
}

/// A failed HTTP exchange, reduced to a reason safe to show users.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct TransportError {
    /// Generic description of the failure.
    pub reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Response to an outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport used to fetch the key-set document.
///
/// Swap in a custom implementation to route requests through an
/// existing client, or to serve a fixed document in tests.
pub trait HttpClient: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Default transport over `reqwest::blocking`.
///
/// Enforces a request timeout, refuses redirects (no HTTPS → HTTP
/// downgrade) and bounds the response body.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
    max_response_bytes: u64,
}

impl ReqwestHttpClient {
    /// Build a client with the given timeout and body limit.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the TLS backend cannot be set up.
    pub fn new(timeout: Duration, max_response_bytes: u64) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("apple-signin/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::new(sanitize_reqwest_error(&e)))?;

        Ok(Self {
            client,
            max_response_bytes,
        })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .map_err(|e| TransportError::new(sanitize_reqwest_error(&e)))?;

        let status = response.status().as_u16();
        let body = read_bounded_response(response, self.max_response_bytes)?;
        Ok(HttpResponse { status, body })
    }
}

/// Read a response body with a size limit to prevent resource exhaustion.
///
/// Bounds the read to `limit + 1` bytes so an oversized body is detected
/// without buffering all of it.
fn read_bounded_response(
    response: reqwest::blocking::Response,
    limit: u64,
) -> Result<Vec<u8>, TransportError> {
    let mut bytes = Vec::new();
    response
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|_| TransportError::new("failed to read response body"))?;

    if bytes.len() as u64 > limit {
        return Err(TransportError::new(format!(
            "response exceeds maximum size of {limit} bytes"
        )));
    }

    Ok(bytes)
}

/// Sanitize a `reqwest` error into a user-friendly reason string.
///
/// Maps common error types to generic messages rather than forwarding
/// raw error strings that may leak internal system details.
fn sanitize_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "connection timed out".to_string()
    } else if err.is_connect() {
        "failed to connect to server".to_string()
    } else if err.is_redirect() {
        "too many redirects".to_string()
    } else if err.is_builder() {
        "failed to build HTTP client".to_string()
    } else {
        "request failed".to_string()
    }
}

/// Resolves a key identifier to the issuer's descriptor for it.
pub trait KeyResolver: Send + Sync {
    /// # Errors
    ///
    /// Fetch failures as [`VerificationError::KeySetUnavailable`] or
    /// [`VerificationError::KeySetEmpty`]; an unknown `kid` as
    /// [`VerificationError::KeyNotFound`].
    fn resolve(&self, kid: &str) -> Result<KeyDescriptor, VerificationError>;
}

/// Fetches the issuer's key set. Every call goes to the network.
#[derive(Clone)]
pub struct KeySetClient {
    url: String,
    display_url: String,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for KeySetClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeySetClient")
            .field("url", &self.display_url)
            .finish_non_exhaustive()
    }
}

impl KeySetClient {
    /// Create a client for `url` over the given transport.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::InvalidKeySetUrl`] unless `url` is an
    /// HTTPS URL, or plain HTTP on a loopback host.
    pub fn new(url: &str, http: Arc<dyn HttpClient>) -> Result<Self, VerificationError> {
        let display_url = validate_url_scheme(url)?;
        Ok(Self {
            url: url.to_string(),
            display_url,
            http,
        })
    }

    /// Create a client using the default `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::InvalidKeySetUrl`] for a bad URL and
    /// [`VerificationError::KeySetUnavailable`] if the HTTP client cannot
    /// be built.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, VerificationError> {
        let display_url = validate_url_scheme(&config.key_set_url)?;
        let http = ReqwestHttpClient::new(config.timeout, config.max_response_bytes).map_err(
            |e| VerificationError::KeySetUnavailable {
                url: display_url.clone(),
                reason: e.reason,
            },
        )?;
        Ok(Self {
            url: config.key_set_url.clone(),
            display_url,
            http: Arc::new(http),
        })
    }

    /// The endpoint, stripped of credentials, query and fragment.
    pub fn url(&self) -> &str {
        &self.display_url
    }

    /// GET and parse the key-set document.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::KeySetUnavailable`] on transport
    /// failure, a non-2xx status or an unparseable body, and
    /// [`VerificationError::KeySetEmpty`] if the document has no keys.
    pub fn fetch(&self) -> Result<KeySetDocument, VerificationError> {
        tracing::debug!(url = %self.display_url, "fetching key set");

        let response =
            self.http
                .get(&self.url)
                .map_err(|e| VerificationError::KeySetUnavailable {
                    url: self.display_url.clone(),
                    reason: e.reason,
                })?;

        if !(200..300).contains(&response.status) {
            return Err(VerificationError::KeySetUnavailable {
                url: self.display_url.clone(),
                reason: format!("server returned HTTP {}", response.status),
            });
        }

        let document = KeySetDocument::from_slice(&response.body, &self.display_url)?;
        tracing::debug!(
            url = %self.display_url,
            keys = document.keys().len(),
            "fetched key set"
        );
        Ok(document)
    }

    /// Fetch the key set and return the descriptor for `kid`.
    ///
    /// # Errors
    ///
    /// See [`KeySetClient::fetch`] and [`KeySetDocument::find_by_kid`].
    pub fn find_by_kid(&self, kid: &str) -> Result<KeyDescriptor, VerificationError> {
        self.fetch()?.find_by_kid(kid).cloned()
    }
}

impl KeyResolver for KeySetClient {
    fn resolve(&self, kid: &str) -> Result<KeyDescriptor, VerificationError> {
        self.find_by_kid(kid)
    }
}

/// Accept HTTPS URLs, and plain HTTP only on loopback hosts.
///
/// Returns the URL sanitized for display.
fn validate_url_scheme(url: &str) -> Result<String, VerificationError> {
    let parsed = reqwest::Url::parse(url).map_err(|_| VerificationError::InvalidKeySetUrl {
        url: sanitize_for_display(url),
        reason: "not a valid URL".to_string(),
    })?;

    let is_loopback = matches!(
        parsed.host_str(),
        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
    );

    match parsed.scheme() {
        "https" => Ok(sanitize_url_for_display(&parsed)),
        "http" if is_loopback => Ok(sanitize_url_for_display(&parsed)),
        scheme => Err(VerificationError::InvalidKeySetUrl {
            url: sanitize_url_for_display(&parsed),
            reason: format!("only HTTPS URLs are accepted (got scheme '{scheme}')"),
        }),
    }
}

/// Strip credentials, query parameters and fragment from a URL so
/// secrets embedded in it never reach logs or error messages.
fn sanitize_url_for_display(url: &reqwest::Url) -> String {
    let mut sanitized = url.clone();
    let _ = sanitized.set_username("");
    let _ = sanitized.set_password(None);
    sanitized.set_query(None);
    sanitized.set_fragment(None);
    sanitized.to_string()
}

//! Verifier configuration.
//!
//! The verifier holds no process-wide state; everything it needs is
//! carried in a [`VerifierConfig`] value.

use std::time::Duration;

/// Apple's published signing keys for Sign In with Apple identity tokens.
pub const APPLE_KEYS_URL: &str = "https://appleid.apple.com/auth/keys";

/// Default HTTP request timeout for the key-set fetch, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Maximum key-set response body size in bytes (1 MiB).
pub const MAX_KEY_SET_SIZE: u64 = 1_048_576;

/// Default minimum gap between cache refetches triggered by an unknown `kid`.
pub const DEFAULT_REFETCH_COOLDOWN_SECS: u64 = 10;

/// Settings for a [`TokenVerifier`](crate::TokenVerifier).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// URL of the issuer's key-set document.
    pub key_set_url: String,
    /// Request timeout for the key-set fetch.
    pub timeout: Duration,
    /// Tolerance applied to `exp`, `nbf` and `iat` checks.
    pub clock_skew_seconds: u64,
    /// Keep fetched key sets for this long. `None` re-fetches on every call.
    pub cache_ttl: Option<Duration>,
    /// With caching on, an unknown `kid` refetches only if the cached
    /// key set is at least this old.
    pub refetch_cooldown: Duration,
    /// Upper bound on the key-set response body.
    pub max_response_bytes: u64,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            key_set_url: APPLE_KEYS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            clock_skew_seconds: 0,
            cache_ttl: None,
            refetch_cooldown: Duration::from_secs(DEFAULT_REFETCH_COOLDOWN_SECS),
            max_response_bytes: MAX_KEY_SET_SIZE,
        }
    }
}

impl VerifierConfig {
    /// Point the verifier at a different key-set endpoint.
    pub fn with_key_set_url(mut self, url: impl Into<String>) -> Self {
        self.key_set_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_clock_skew_seconds(mut self, seconds: u64) -> Self {
        self.clock_skew_seconds = seconds;
        self
    }

    /// Enable key-set caching with the given time-to-live.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_refetch_cooldown(mut self, cooldown: Duration) -> Self {
        self.refetch_cooldown = cooldown;
        self
    }

    pub fn with_max_response_bytes(mut self, bytes: u64) -> Self {
        self.max_response_bytes = bytes;
        self
    }
}

//! Optional key-set caching.
//!
//! Wraps a [`KeySetClient`] with a concurrent, time-bounded cache so a
//! busy verifier does not hit the issuer once per token. A cached
//! document that lacks the requested `kid` is re-fetched, which picks up
//! rotated keys without waiting for expiry, but at most once per refetch
//! cooldown so made-up `kid` values cannot drive a fetch per token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::sync::Cache;

use crate::config::DEFAULT_REFETCH_COOLDOWN_SECS;
use crate::core::jwks::{KeyDescriptor, KeyResolver, KeySetClient, KeySetDocument};
use crate::error::VerificationError;

#[derive(Debug, Clone)]
struct CachedDocument {
    document: Arc<KeySetDocument>,
    fetched_at: Instant,
}

/// A [`KeySetClient`] with a TTL cache in front of it.
#[derive(Debug, Clone)]
pub struct CachedKeySet {
    client: KeySetClient,
    cache: Cache<String, CachedDocument>,
    refetch_cooldown: Duration,
}

impl CachedKeySet {
    /// Cache documents fetched by `client` for `ttl`.
    pub fn new(client: KeySetClient, ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).build();
        Self {
            client,
            cache,
            refetch_cooldown: Duration::from_secs(DEFAULT_REFETCH_COOLDOWN_SECS),
        }
    }

    /// Minimum age of the cached document before an unknown `kid` may
    /// trigger a refetch.
    pub fn with_refetch_cooldown(mut self, cooldown: Duration) -> Self {
        self.refetch_cooldown = cooldown;
        self
    }

    /// Drop the cached document, forcing the next lookup to fetch.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }

    /// The cached document, if one is present and unexpired.
    pub fn cached(&self) -> Option<Arc<KeySetDocument>> {
        self.cache.get(self.client.url()).map(|entry| entry.document)
    }

    fn refresh(&self) -> Result<Arc<KeySetDocument>, VerificationError> {
        let document = Arc::new(self.client.fetch()?);
        self.cache.insert(
            self.client.url().to_string(),
            CachedDocument {
                document: Arc::clone(&document),
                fetched_at: Instant::now(),
            },
        );
        Ok(document)
    }
}

impl KeyResolver for CachedKeySet {
    fn resolve(&self, kid: &str) -> Result<KeyDescriptor, VerificationError> {
        if let Some(entry) = self.cache.get(self.client.url()) {
            if entry.document.contains(kid) {
                tracing::debug!(url = %self.client.url(), "key set cache hit");
                return entry.document.find_by_kid(kid).cloned();
            }
            if entry.fetched_at.elapsed() < self.refetch_cooldown {
                tracing::debug!(url = %self.client.url(), "unknown kid within refetch cooldown");
                return entry.document.find_by_kid(kid).cloned();
            }
        }

        tracing::debug!(url = %self.client.url(), "key set cache miss");
        self.refresh()?.find_by_kid(kid).cloned()
    }
}

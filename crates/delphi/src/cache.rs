//! Memoization of provider responses to reduce API calls

use cached::{Cached, TimedSizedCache};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Cache key: the provider operation plus its single string argument
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Operation name, e.g. `fetch_news`
    pub function: String,
    /// Argument the operation was called with (query or ticker)
    pub args: String,
}

impl CacheKey {
    /// Create a new cache key
    pub fn new(function: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            args: args.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function, self.args)
    }
}

/// Thread-safe, bounded, time-limited cache of provider results
///
/// Entries expire `ttl` after insertion. When full, the least recently used
/// entry is evicted. Clones share the same storage.
#[derive(Clone)]
pub struct ApiCache {
    cache: Arc<RwLock<TimedSizedCache<CacheKey, Value>>>,
}

impl ApiCache {
    /// Create a new cache holding at most `max_entries` values for `ttl` each
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedSizedCache::with_size_and_lifespan(
                max_entries.max(1),
                ttl,
            ))),
        }
    }

    /// Get a live value from the cache
    pub async fn get(&self, key: &CacheKey) -> Option<Value> {
        // cache_get updates recency and drops expired entries, so it needs the write half
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    /// Insert a value into the cache
    pub async fn insert(&self, key: CacheKey, value: Value) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, value);
    }

    /// Return the cached value for `key` or run `fetcher` and remember its result
    ///
    /// Only `Ok` results are stored; an error is returned to the caller and the
    /// next call with the same key fetches again. Concurrent misses on the same
    /// key may each invoke their fetcher.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: CacheKey, fetcher: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get(&key).await {
            tracing::debug!(key = %key, "Cache hit");
            return Ok(value);
        }

        tracing::debug!(key = %key, "Cache miss");

        let value = fetcher().await?;
        self.insert(key, value.clone()).await;

        Ok(value)
    }

    /// Get the number of stored entries (expired ones included until touched)
    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for ApiCache {
    fn default() -> Self {
        Self::new(128, Duration::from_secs(600))
    }
}

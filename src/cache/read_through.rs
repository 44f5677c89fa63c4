//! Read-through cache over a [`KvStore`].

use crate::error::BoxError;
use crate::keys::CacheKey;
use crate::store::KvStore;
use crate::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub default_ttl: Duration,
    /// When false every call computes and nothing touches the store.
    pub enabled: bool,
    /// Encoded values larger than this are returned but not stored.
    pub max_entry_size: usize,
    pub key_prefix: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            enabled: true,
            max_entry_size: 1024 * 1024,
            key_prefix: None,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_entry_size(mut self, bytes: usize) -> Self {
        self.max_entry_size = bytes;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub errors: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Cache-aside helper: consult the store, compute on a miss, write back.
///
/// Concurrent misses on the same key are not coalesced. Each caller computes
/// and writes, and the last write wins.
#[derive(Clone)]
pub struct ReadThroughCache {
    config: CacheConfig,
    store: Arc<dyn KvStore>,
    stats: Arc<AtomicStats>,
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .field("stats", &self.stats.to_stats())
            .finish()
    }
}

impl ReadThroughCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_config(store, CacheConfig::default())
    }

    pub fn with_config(store: Arc<dyn KvStore>, config: CacheConfig) -> Self {
        Self {
            config,
            store,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached value for `key`, or compute, store and return it.
    ///
    /// `fetch` runs only on a miss. If it fails the error is returned as
    /// [`Error::FetchFailed`] and nothing is written. Store errors are
    /// returned unchanged; there is no fallback to computing without the store.
    pub async fn get_cached<T, F, Fut, E>(
        &self,
        key: impl Into<CacheKey>,
        ttl: Duration,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        let key = key.into();
        if !self.config.enabled {
            return Self::run_fetch(&key, fetch).await;
        }
        if key.is_reserved() {
            warn!(key = %key, "Cache key collides with a reserved namespace");
        }

        let store_key = self.store_key(&key);
        match self.store.get(&store_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    AtomicStats::bump(&self.stats.hits);
                    debug!(key = %store_key, "Cache HIT");
                    return Ok(value);
                }
                Err(e) => {
                    AtomicStats::bump(&self.stats.errors);
                    AtomicStats::bump(&self.stats.misses);
                    warn!(
                        key = %store_key,
                        error = %e,
                        "Cached value did not decode, recomputing"
                    );
                }
            },
            Ok(None) => {
                AtomicStats::bump(&self.stats.misses);
                debug!(key = %store_key, "Cache MISS");
            }
            Err(e) => {
                AtomicStats::bump(&self.stats.errors);
                return Err(e);
            }
        }

        let value = Self::run_fetch(&key, fetch).await?;
        let encoded = serde_json::to_string(&value)?;
        if encoded.len() > self.config.max_entry_size {
            debug!(
                key = %store_key,
                size = encoded.len(),
                max = self.config.max_entry_size,
                "Value too large to cache"
            );
            return Ok(value);
        }

        if let Err(e) = self.store.set(&store_key, &encoded, ttl).await {
            AtomicStats::bump(&self.stats.errors);
            return Err(e);
        }
        AtomicStats::bump(&self.stats.sets);
        debug!(key = %store_key, ttl_seconds = ttl.as_secs(), "Cache SET");
        Ok(value)
    }

    /// [`get_cached`](Self::get_cached) with the configured default TTL.
    pub async fn get_cached_default<T, F, Fut, E>(
        &self,
        key: impl Into<CacheKey>,
        fetch: F,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        self.get_cached(key, self.config.default_ttl, fetch).await
    }

    /// Drop a cached entry. Returns whether one existed.
    pub async fn invalidate(&self, key: impl Into<CacheKey>) -> Result<bool> {
        let store_key = self.store_key(&key.into());
        let removed = self.store.delete(&store_key).await?;
        debug!(key = %store_key, removed = removed, "Cache DEL");
        Ok(removed)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    async fn run_fetch<T, F, Fut, E>(key: &CacheKey, fetch: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Into<BoxError>,
    {
        fetch().await.map_err(|e| Error::FetchFailed {
            key: key.to_string(),
            source: e.into(),
        })
    }

    fn store_key(&self, key: &CacheKey) -> String {
        match self.config.key_prefix {
            Some(ref p) => format!("{}:{}", p, key),
            None => key.to_string(),
        }
    }
}

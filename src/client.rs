use crate::cache::{CacheConfig, ReadThroughCache};
use crate::config::KvConfig;
use crate::rate_limit::RateLimiter;
use crate::session::SessionStore;
use crate::store::{KvStore, MemoryStore, TimeoutStore};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

#[cfg(feature = "redis")]
use crate::{store::RedisStore, Result};

/// One explicitly constructed store handle, shared by the components.
///
/// Components built from the same client see the same keys; none of them
/// calls another.
#[derive(Clone)]
pub struct KvClient {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for KvClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvClient")
            .field("store", &self.store.name())
            .finish()
    }
}

impl KvClient {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Backed by a fresh [`MemoryStore`]; for tests and single-process use.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Wrap an already connected store, bounding every call by
    /// `config.operation_timeout` when one is set.
    pub fn from_store<S: KvStore + 'static>(store: S, config: &KvConfig) -> Self {
        let store: Arc<dyn KvStore> = match config.operation_timeout {
            Some(timeout) => Arc::new(TimeoutStore::new(store, timeout)),
            None => Arc::new(store),
        };
        Self::new(store)
    }

    /// Connect to a Redis-compatible store.
    #[cfg(feature = "redis")]
    pub async fn connect(config: &KvConfig) -> Result<Self> {
        config.validate()?;
        let redis = RedisStore::connect(config).await?;
        Ok(Self::from_store(redis, config))
    }

    pub fn store(&self) -> Arc<dyn KvStore> {
        Arc::clone(&self.store)
    }

    pub fn rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.store())
    }

    pub fn cache(&self) -> ReadThroughCache {
        ReadThroughCache::new(self.store())
    }

    pub fn cache_with_config(&self, config: CacheConfig) -> ReadThroughCache {
        ReadThroughCache::with_config(self.store(), config)
    }

    pub fn sessions<T>(&self) -> SessionStore<T>
    where
        T: Serialize + DeserializeOwned,
    {
        SessionStore::new(self.store())
    }
}

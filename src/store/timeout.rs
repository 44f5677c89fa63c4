use super::KvStore;
use crate::{Error, Result};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounds every primitive call on the inner store with a deadline.
///
/// An elapsed deadline is reported as `StoreUnavailable`. Calls are never
/// retried; an `incr` that timed out may still have been applied remotely.
#[derive(Debug)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: KvStore> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        key: &str,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    operation = operation,
                    key = key,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Store call timed out"
                );
                Err(Error::store_unavailable(
                    operation,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        }
    }
}

#[async_trait]
impl<S: KvStore> KvStore for TimeoutStore<S> {
    async fn incr(&self, key: &str) -> Result<i64> {
        self.bounded("INCR", key, self.inner.incr(key)).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.bounded("EXPIRE", key, self.inner.expire(key, ttl)).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.bounded("GET", key, self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.bounded("SET", key, self.inner.set(key, value, ttl)).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.bounded("DEL", key, self.inner.delete(key)).await
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

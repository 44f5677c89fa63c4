//! Key-value store adapters.
//!
//! [`KvStore`] is the only seam between this crate and the external store.
//! It exposes the five primitives the components need and nothing else:
//!
//! | Primitive | Semantics |
//! |-----------|-----------|
//! | `incr`    | atomic +1, creating the key at 1 when absent |
//! | `expire`  | set or refresh a TTL on an existing key |
//! | `get`     | read, respecting expiry |
//! | `set`     | write with a TTL, replacing any previous value |
//! | `delete`  | remove, absent keys are not an error |
//!
//! Implementations surface every failure as [`Error::StoreUnavailable`](crate::Error)
//! and never retry. Resilience belongs outside the primitives (see
//! [`TimeoutStore`]) so that `incr` is issued at most once per call.

mod memory;
#[cfg(feature = "redis")]
mod redis;
mod timeout;

pub use memory::MemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisStore;
pub use timeout::TimeoutStore;

use crate::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Atomically increment the integer at `key` and return the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// Set a TTL on an existing key.
    ///
    /// Returns `Ok(false)` when the key no longer exists.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Returns whether a key was actually removed.
    async fn delete(&self, key: &str) -> Result<bool>;

    fn name(&self) -> &'static str;
}

/// Whole seconds for stores that only accept second granularity.
///
/// Rounds up and never returns 0, which most stores read as "no expiry".
pub(crate) fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    let secs = if ttl.subsec_nanos() > 0 { secs + 1 } else { secs };
    secs.max(1)
}

//! Fixed-window rate limiter.
//!
//! Each identifier gets one counter, `rate-limit:{identifier}`. The first call
//! in a window creates the counter and sets its TTL to the window length;
//! later calls only increment it. The window therefore starts at the first
//! call and ends when the store expires the counter.
//!
//! Increment and expire are two round trips. If the process dies between them
//! the counter never expires and the identifier stays blocked until the key is
//! removed by hand.

use crate::keys::rate_limit_key;
use crate::store::KvStore;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Calls admitted per window.
    pub limit: u64,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(limit: u64, window: Duration) -> Self {
        Self { limit, window }
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            limit: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of a single rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Calls left in the current window, never negative.
    pub remaining: u64,
    /// Counter value after this call (admitted and rejected calls both count).
    pub count: u64,
    pub limit: u64,
}

impl RateLimitDecision {
    /// Turn a rejection into [`Error::RateLimited`].
    pub fn into_result(self, identifier: &str, window: Duration) -> Result<Self> {
        if self.allowed {
            Ok(self)
        } else {
            Err(Error::RateLimited {
                identifier: identifier.to_string(),
                limit: self.limit,
                window_secs: window.as_secs(),
            })
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("store", &self.store.name())
            .finish()
    }
}

impl RateLimiter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Count one call for `identifier` and decide whether it is admitted.
    ///
    /// Neither `limit` nor `window` is stored. `window` only matters when the
    /// call creates the counter; `limit` is compared on every call. Store
    /// failures are returned as-is, the caller decides whether to fail open
    /// or closed.
    pub async fn check(
        &self,
        identifier: &str,
        limit: u64,
        window: Duration,
    ) -> Result<RateLimitDecision> {
        let key = rate_limit_key(identifier);
        let count = self.store.incr(&key).await?;

        if count == 1 {
            match self.store.expire(&key, window).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(key = %key, "Rate-limit counter vanished before expire");
                }
                Err(e) => {
                    warn!(
                        key = %key,
                        error = %e,
                        "Failed to set rate-limit window; counter may not expire"
                    );
                    return Err(e);
                }
            }
        }

        // Only a foreign writer can leave a negative counter behind
        let count = u64::try_from(count).map_err(|_| {
            Error::store_unavailable("INCR", format!("counter {} is negative", count))
        })?;
        let decision = RateLimitDecision {
            allowed: count <= limit,
            remaining: limit.saturating_sub(count),
            count,
            limit,
        };

        if !decision.allowed {
            debug!(
                identifier = identifier,
                count = count,
                limit = limit,
                "Rate limit exceeded"
            );
        }
        Ok(decision)
    }

    pub async fn check_policy(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision> {
        self.check(identifier, policy.limit, policy.window).await
    }

    /// Like [`check_policy`](Self::check_policy), but a rejection is an error.
    pub async fn enforce(
        &self,
        identifier: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision> {
        self.check_policy(identifier, policy)
            .await?
            .into_result(identifier, policy.window)
    }
}

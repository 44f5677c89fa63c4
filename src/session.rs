//! Per-principal session records.
//!
//! One record per principal under `session:{principal_id}`. Writes replace the
//! record and restart its TTL; reads never extend it.

use crate::keys::session_key;
use crate::store::KvStore;
use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Typed session storage; `T` is the payload schema shared by all principals.
pub struct SessionStore<T> {
    store: Arc<dyn KvStore>,
    default_ttl: Duration,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Clone for SessionStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            default_ttl: self.default_ttl,
            _payload: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for SessionStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("store", &self.store.name())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl<T> SessionStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            default_ttl: DEFAULT_SESSION_TTL,
            _payload: PhantomData,
        }
    }

    /// Override the TTL used by [`set`](Self::set).
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Load the session for `principal_id`, if one is live.
    ///
    /// A stored record that does not decode as `T` is a serialization error.
    pub async fn get(&self, principal_id: &str) -> Result<Option<T>> {
        let key = session_key(principal_id);
        match self.store.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => {
                debug!(key = %key, "No session");
                Ok(None)
            }
        }
    }

    pub async fn set(&self, principal_id: &str, payload: &T) -> Result<()> {
        self.set_with_ttl(principal_id, payload, self.default_ttl).await
    }

    /// Store `payload`, replacing any existing record and restarting the TTL.
    pub async fn set_with_ttl(
        &self,
        principal_id: &str,
        payload: &T,
        ttl: Duration,
    ) -> Result<()> {
        let key = session_key(principal_id);
        let encoded = serde_json::to_string(payload)?;
        self.store.set(&key, &encoded, ttl).await?;
        debug!(key = %key, ttl_seconds = ttl.as_secs(), "Session stored");
        Ok(())
    }

    /// Remove the session. Deleting an absent session succeeds.
    pub async fn delete(&self, principal_id: &str) -> Result<()> {
        let key = session_key(principal_id);
        let removed = self.store.delete(&key).await?;
        debug!(key = %key, removed = removed, "Session deleted");
        Ok(())
    }
}

//! In-process store with the same observable semantics as the network store.

use super::{ttl_seconds, KvStore};
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }
}

/// In-memory [`KvStore`].
///
/// Expiry is measured on the tokio clock, so tests can pause and advance time.
/// Expired entries are invisible to every operation and dropped when next
/// touched, or in bulk by [`purge_expired`](Self::purge_expired). TTLs are
/// rounded up to whole seconds like the network store, so a zero TTL lives
/// for one second. A single mutex makes `incr` atomic across tasks.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining lifetime of a live key; `None` when absent or persistent.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }

    /// Drop every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        match self.entries.lock() {
            Ok(mut entries) => {
                let before = entries.len();
                entries.retain(|_, e| !e.is_expired(now));
                before - entries.len()
            }
            Err(_) => 0,
        }
    }

    /// Lock the map with `key` already purged if it has expired.
    fn lock(
        &self,
        operation: &'static str,
        key: &str,
    ) -> Result<MutexGuard<'_, HashMap<String, Entry>>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| Error::store_unavailable(operation, "memory store lock poisoned"))?;
        let now = Instant::now();
        if entries.get(key).map(|e| e.is_expired(now)).unwrap_or(false) {
            entries.remove(key);
        }
        Ok(entries)
    }
}

fn deadline(ttl: Duration) -> Instant {
    Instant::now() + Duration::from_secs(ttl_seconds(ttl))
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut entries = self.lock("INCR", key)?;
        let entry = entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });
        let current: i64 = entry.value.parse().map_err(|_| {
            Error::store_unavailable("INCR", "value is not an integer or out of range")
        })?;
        let next = current
            .checked_add(1)
            .ok_or_else(|| Error::store_unavailable("INCR", "increment would overflow"))?;
        entry.value = next.to_string();
        Ok(next)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.lock("EXPIRE", key)?;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(deadline(ttl));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.lock("GET", key)?;
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.lock("SET", key)?;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(deadline(ttl)),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut entries = self.lock("DEL", key)?;
        Ok(entries.remove(key).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

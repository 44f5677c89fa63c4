//! Shared test fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use kvkit::{Error, KvStore, MemoryStore, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Which primitive a [`FlakyStore`] should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    Nothing,
    Incr,
    Expire,
    Get,
    Set,
    Delete,
    Everything,
}

/// A [`MemoryStore`] that fails the selected primitive on demand and counts calls.
pub struct FlakyStore {
    inner: MemoryStore,
    fail: std::sync::Mutex<Fail>,
    pub expire_calls: AtomicUsize,
    pub set_calls: AtomicUsize,
    vanish_before_expire: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            fail: std::sync::Mutex::new(Fail::Nothing),
            expire_calls: AtomicUsize::new(0),
            set_calls: AtomicUsize::new(0),
            vanish_before_expire: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, what: Fail) {
        *self.fail.lock().unwrap() = what;
    }

    /// Simulate the counter expiring between INCR and EXPIRE.
    pub fn vanish_before_expire(&self, on: bool) {
        self.vanish_before_expire.store(on, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self, op: Fail, name: &'static str) -> Result<()> {
        let fail = *self.fail.lock().unwrap();
        if fail == op || fail == Fail::Everything {
            Err(Error::store_unavailable(name, "connection reset by peer"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvStore for FlakyStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        self.check(Fail::Incr, "INCR")?;
        self.inner.incr(key).await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.expire_calls.fetch_add(1, Ordering::SeqCst);
        self.check(Fail::Expire, "EXPIRE")?;
        if self.vanish_before_expire.load(Ordering::SeqCst) {
            self.inner.delete(key).await?;
        }
        self.inner.expire(key, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check(Fail::Get, "GET")?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.check(Fail::Set, "SET")?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check(Fail::Delete, "DEL")?;
        self.inner.delete(key).await
    }

    fn name(&self) -> &'static str {
        "flaky"
    }
}

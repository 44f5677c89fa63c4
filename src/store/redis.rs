//! Redis-protocol store adapter.
//!
//! Uses `redis::aio::ConnectionManager` for a multiplexed connection with
//! automatic reconnection. Works against any Redis-compatible service.

use super::{ttl_seconds, KvStore};
use crate::config::KvConfig;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Clone)]
pub struct RedisStore {
    connection_manager: redis::aio::ConnectionManager,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connection_manager", &"ConnectionManager")
            .finish()
    }
}

fn unavailable(operation: &'static str, e: redis::RedisError) -> Error {
    Error::store_unavailable(operation, e.to_string())
}

impl RedisStore {
    /// Connect using the given configuration.
    ///
    /// Connection establishment is bounded by `config.connect_timeout`.
    pub async fn connect(config: &KvConfig) -> Result<Self> {
        let client =
            redis::Client::open(config.url.as_str()).map_err(|e| unavailable("CONNECT", e))?;

        let connection_manager = tokio::time::timeout(
            config.connect_timeout,
            redis::aio::ConnectionManager::new(client),
        )
        .await
        .map_err(|_| {
            Error::store_unavailable(
                "CONNECT",
                format!("timed out after {:?}", config.connect_timeout),
            )
        })?
        .map_err(|e| unavailable("CONNECT", e))?;

        info!(url = %config.redacted_url(), "Redis store connected");

        Ok(Self { connection_manager })
    }

    /// Round-trip check used by health probes.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("PING", e))?;
        if pong == "PONG" {
            Ok(())
        } else {
            Err(Error::store_unavailable(
                "PING",
                format!("unexpected reply '{}'", pong),
            ))
        }
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn incr(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection_manager.clone();
        let count: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("INCR", e))?;
        debug!(key = key, count = count, "INCR");
        Ok(count)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.connection_manager.clone();
        let applied: i64 = redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl_seconds(ttl))
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("EXPIRE", e))?;
        Ok(applied == 1)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection_manager.clone();
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("GET", e))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.connection_manager.clone();
        let ttl_seconds = ttl_seconds(ttl);
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("SET", e))?;
        debug!(key = key, ttl_seconds = ttl_seconds, "SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection_manager.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| unavailable("DEL", e))?;
        Ok(removed > 0)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

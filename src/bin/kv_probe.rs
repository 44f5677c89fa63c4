//! Connectivity probe for a deployed key-value store.
//!
//! Reads `KV_URL` / `REDIS_URL` (see `kvkit::config`), then exercises the rate
//! limiter, the read-through cache and the session store on throwaway keys.
//! Exits non-zero on the first failure.

use anyhow::Context;
use kvkit::store::RedisStore;
use kvkit::{KvClient, KvConfig, KvStore};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ProbeSession {
    probe_id: String,
    started_by: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .try_init();

    let config = KvConfig::from_env().context("loading store configuration")?;
    println!("Using store: {}", config.redacted_url());

    config.validate().context("validating store configuration")?;
    let redis = RedisStore::connect(&config)
        .await
        .context("connecting to store")?;
    redis.ping().await.context("PING")?;
    println!("PING ✅");

    let client = KvClient::from_store(redis, &config);
    let probe_id = uuid::Uuid::new_v4().to_string();

    let limiter = client.rate_limiter();
    let identifier = format!("kv-probe:{}", probe_id);
    let decision = limiter
        .check(&identifier, 1, Duration::from_secs(5))
        .await
        .context("rate limit check")?;
    anyhow::ensure!(decision.allowed, "first call in a fresh window was rejected");
    let decision = limiter.check(&identifier, 1, Duration::from_secs(5)).await?;
    anyhow::ensure!(!decision.allowed, "second call over a limit of 1 was admitted");
    println!("Rate limiter ✅");

    let cache = client.cache();
    let cache_key = format!("kv-probe:cache:{}", probe_id);
    let expected = probe_id.clone();
    let first: String = cache
        .get_cached(&cache_key, Duration::from_secs(5), move || async move {
            Ok::<_, Infallible>(expected)
        })
        .await?;
    let second: String = cache
        .get_cached(&cache_key, Duration::from_secs(5), || async {
            Ok::<_, Infallible>("recomputed".to_string())
        })
        .await?;
    anyhow::ensure!(first == second, "cached value was recomputed");
    cache.invalidate(&cache_key).await?;
    println!("Read-through cache ✅ (stats: {:?})", cache.stats());

    let sessions = client.sessions::<ProbeSession>();
    let principal = format!("kv-probe-{}", probe_id);
    let payload = ProbeSession {
        probe_id: probe_id.clone(),
        started_by: "kv_probe".to_string(),
    };
    sessions
        .set_with_ttl(&principal, &payload, Duration::from_secs(5))
        .await?;
    anyhow::ensure!(
        sessions.get(&principal).await?.as_ref() == Some(&payload),
        "session did not round-trip"
    );
    sessions.delete(&principal).await?;
    anyhow::ensure!(
        sessions.get(&principal).await?.is_none(),
        "session survived delete"
    );
    println!("Session store ✅");

    // The probe's rate-limit counter is left to expire on its own.
    let leftover = client
        .store()
        .get(&format!("rate-limit:{}", identifier))
        .await?;
    println!("All checks passed (counter value: {:?})", leftover);
    Ok(())
}

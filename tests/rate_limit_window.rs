//! Fixed-window rate limiter behavior against an in-memory store.

mod common;

use common::{Fail, FlakyStore};
use kvkit::{KvClient, KvStore, MemoryStore, RateLimiter};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const WINDOW: Duration = Duration::from_secs(60);

fn limiter() -> RateLimiter {
    KvClient::in_memory().rate_limiter()
}

#[tokio::test]
async fn test_four_rapid_calls_against_limit_of_three() {
    let limiter = limiter();
    let mut results = Vec::new();
    for _ in 0..4 {
        let d = limiter.check("ip:1.2.3.4", 3, WINDOW).await.unwrap();
        results.push((d.allowed, d.remaining));
    }
    assert_eq!(results, vec![(true, 2), (true, 1), (true, 0), (false, 0)]);
}

#[tokio::test]
async fn test_exactly_limit_calls_are_admitted() {
    let limiter = limiter();
    for limit in [1u64, 5, 17] {
        let id = format!("user:{}", limit);
        let mut previous = limit;
        for _ in 0..limit {
            let d = limiter.check(&id, limit, WINDOW).await.unwrap();
            assert!(d.allowed);
            assert!(d.remaining < previous, "remaining must strictly decrease");
            previous = d.remaining;
        }
        assert_eq!(previous, 0);
        let over = limiter.check(&id, limit, WINDOW).await.unwrap();
        assert!(!over.allowed);
        assert_eq!(over.remaining, 0);
        assert_eq!(over.count, limit + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_window_is_anchored_to_first_call() {
    let limiter = limiter();

    assert!(limiter.check("ip", 2, WINDOW).await.unwrap().allowed);
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(limiter.check("ip", 2, WINDOW).await.unwrap().allowed);
    tokio::time::advance(Duration::from_secs(29)).await;
    // 59s after the first call: still the same window
    assert!(!limiter.check("ip", 2, WINDOW).await.unwrap().allowed);

    // 60s after the first call (not the last): the counter is gone
    tokio::time::advance(Duration::from_secs(1)).await;
    let d = limiter.check("ip", 2, WINDOW).await.unwrap();
    assert!(d.allowed);
    assert_eq!(d.count, 1);
    assert_eq!(d.remaining, 1);
}

#[tokio::test(start_paused = true)]
async fn test_new_window_uses_new_window_length() {
    let store = Arc::new(MemoryStore::new());
    let limiter = RateLimiter::new(store.clone());

    limiter.check("job", 5, Duration::from_secs(10)).await.unwrap();
    // A different window length mid-window does not touch the live counter
    limiter.check("job", 5, Duration::from_secs(100)).await.unwrap();
    assert_eq!(store.ttl("rate-limit:job"), Some(Duration::from_secs(10)));

    tokio::time::advance(Duration::from_secs(10)).await;
    limiter.check("job", 5, Duration::from_secs(100)).await.unwrap();
    assert_eq!(store.ttl("rate-limit:job"), Some(Duration::from_secs(100)));
}

#[tokio::test]
async fn test_expire_only_on_first_call() {
    let store = Arc::new(FlakyStore::new());
    let limiter = RateLimiter::new(store.clone());
    for _ in 0..5 {
        limiter.check("ip", 3, WINDOW).await.unwrap();
    }
    assert_eq!(store.expire_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_incr_failure_is_store_unavailable() {
    let store = Arc::new(FlakyStore::new());
    let limiter = RateLimiter::new(store.clone());
    store.fail(Fail::Incr);

    let err = assert_err!(limiter.check("ip", 3, WINDOW).await);
    assert!(err.is_store_unavailable());
    assert_eq!(err.http_status(), 503);
}

#[tokio::test]
async fn test_expire_failure_propagates_and_leaves_counter() {
    let store = Arc::new(FlakyStore::new());
    let limiter = RateLimiter::new(store.clone());
    store.fail(Fail::Expire);

    let err = assert_err!(limiter.check("ip", 3, WINDOW).await);
    assert!(err.is_store_unavailable());

    // The increment went through and the counter has no expiry
    assert_eq!(
        store.inner().get("rate-limit:ip").await.unwrap().as_deref(),
        Some("1")
    );
    assert_eq!(store.inner().ttl("rate-limit:ip"), None);
}

#[tokio::test]
async fn test_counter_vanishing_before_expire_is_tolerated() {
    let store = Arc::new(FlakyStore::new());
    let limiter = RateLimiter::new(store.clone());
    store.vanish_before_expire(true);

    let d = assert_ok!(limiter.check("ip", 3, WINDOW).await);
    assert!(d.allowed);
    assert_eq!(d.remaining, 2);
}

#[tokio::test]
async fn test_concurrent_callers_never_over_admit() {
    let limiter = limiter();
    let checks = (0..40).map(|_| {
        let limiter = limiter.clone();
        tokio::spawn(async move { limiter.check("burst", 10, WINDOW).await.unwrap() })
    });
    let decisions = futures::future::join_all(checks).await;

    let admitted = decisions
        .iter()
        .filter(|d| d.as_ref().unwrap().allowed)
        .count();
    assert_eq!(admitted, 10);

    let mut counts: Vec<u64> = decisions.iter().map(|d| d.as_ref().unwrap().count).collect();
    counts.sort_unstable();
    assert_eq!(counts, (1..=40).collect::<Vec<u64>>());
}

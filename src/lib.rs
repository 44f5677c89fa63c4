//! # kvkit
//!
//! Rate limiting, read-through caching and session storage multiplexed over
//! one external key-value store.
//!
//! ## Overview
//!
//! Request handlers and background jobs typically need three things from a
//! shared key-value service:
//!
//! - **Rate limiting**: admit or reject repeated calls per identifier using a
//!   fixed time window ([`RateLimiter`])
//! - **Caching**: reuse the result of an expensive computation until it
//!   expires ([`ReadThroughCache`])
//! - **Sessions**: keep a per-principal payload alive for a bounded time
//!   ([`SessionStore`])
//!
//! All three talk to the store through the [`KvStore`](store::KvStore) trait,
//! hold no local state and make one fresh round trip per primitive. They share
//! a key namespace (see [`keys`]) but never call each other.
//!
//! ## Quick Start
//!
//! ```rust
//! use kvkit::KvClient;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> kvkit::Result<()> {
//! let client = KvClient::in_memory();
//!
//! let decision = client
//!     .rate_limiter()
//!     .check("ip:1.2.3.4", 3, Duration::from_secs(60))
//!     .await?;
//! assert!(decision.allowed);
//! assert_eq!(decision.remaining, 2);
//!
//! let sessions = client.sessions::<Vec<String>>();
//! sessions.set("user-123", &vec!["admin".to_string()]).await?;
//! assert!(sessions.get("user-123").await?.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`store`] | store trait plus memory, Redis and timeout adapters |
//! | [`rate_limit`] | fixed-window rate limiter |
//! | [`cache`] | read-through cache |
//! | [`session`] | typed session store |
//! | [`keys`] | reserved prefixes and cache keys |
//! | [`config`] | connection settings |
//!
//! ## Failure model
//!
//! Every store failure surfaces as [`Error::StoreUnavailable`]. Nothing here
//! retries, falls back to stale data or decides to fail open; those are
//! caller decisions.

pub mod cache;
pub mod client;
pub mod config;
pub mod keys;
pub mod rate_limit;
pub mod session;
pub mod store;

pub use cache::{CacheConfig, CacheStats, ReadThroughCache};
pub use client::KvClient;
pub use config::KvConfig;
pub use keys::CacheKey;
pub use rate_limit::{RateLimitDecision, RateLimitPolicy, RateLimiter};
pub use session::{SessionStore, DEFAULT_SESSION_TTL};
pub use store::{KvStore, MemoryStore};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{BoxError, Error, ErrorContext};

//! # Read-Through Cache
//!
//! Wraps an expensive computation so repeated calls with the same key reuse
//! the stored result until the store expires it.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ReadThroughCache`] | get-or-compute over a shared [`KvStore`](crate::store::KvStore) |
//! | [`CacheConfig`] | default TTL, size cap, optional key prefix |
//! | [`CacheStats`] | hit/miss/set/error counters for this handle |
//!
//! ## Example
//!
//! ```rust
//! use kvkit::cache::ReadThroughCache;
//! use kvkit::store::MemoryStore;
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> kvkit::Result<()> {
//! let cache = ReadThroughCache::new(Arc::new(MemoryStore::new()));
//! let total: u64 = cache
//!     .get_cached("report:weekly", Duration::from_secs(10), || async {
//!         Ok::<_, Infallible>(1250)
//!     })
//!     .await?;
//! assert_eq!(total, 1250);
//! # Ok(())
//! # }
//! ```
//!
//! A live entry is always returned as-is; there is no staleness check beyond
//! the store's TTL and no negative caching of failed computations.

mod read_through;

pub use read_through::{CacheConfig, CacheStats, ReadThroughCache};

//! Key namespace discipline.
//!
//! All components share one flat namespace on the store:
//!
//! ```text
//! rate-limit:{identifier}   → integer counter (expires with the window)
//! session:{principal_id}    → JSON session payload
//! {cache key}               → JSON cache payload, caller-chosen, no reserved prefix
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const RATE_LIMIT_PREFIX: &str = "rate-limit";
pub const SESSION_PREFIX: &str = "session";
pub const KEY_SEPARATOR: char = ':';

const RESERVED_PREFIXES: [&str; 2] = [RATE_LIMIT_PREFIX, SESSION_PREFIX];

pub fn rate_limit_key(identifier: &str) -> String {
    format!("{}{}{}", RATE_LIMIT_PREFIX, KEY_SEPARATOR, identifier)
}

pub fn session_key(principal_id: &str) -> String {
    format!("{}{}{}", SESSION_PREFIX, KEY_SEPARATOR, principal_id)
}

/// Opaque, caller-chosen key for the read-through cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Derive a stable key from structured parameters.
    ///
    /// The parameters go through a `serde_json::Value` first, whose maps are
    /// key-sorted, so map iteration order never leaks into the key. Equal
    /// parameters map to the same entry: `"{namespace}:{sha256-hex}"`.
    pub fn hashed<P: Serialize + ?Sized>(namespace: &str, params: &P) -> crate::Result<Self> {
        let value = serde_json::to_value(params)?;
        let canonical = serde_json::to_vec(&value)?;
        let mut hasher = Sha256::new();
        hasher.update(&canonical);
        let hash: String = hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        Ok(Self(format!("{}{}{}", namespace, KEY_SEPARATOR, hash)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key falls inside a namespace owned by another component.
    pub fn is_reserved(&self) -> bool {
        RESERVED_PREFIXES.iter().any(|prefix| {
            self.0
                .strip_prefix(prefix)
                .map(|rest| rest.starts_with(KEY_SEPARATOR))
                .unwrap_or(false)
        })
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for CacheKey {
    fn from(s: &String) -> Self {
        Self::new(s.as_str())
    }
}

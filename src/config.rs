//! Store connection settings.
//!
//! Only the connection is configured here. Rate-limit budgets and TTLs stay
//! plain call parameters chosen at each call site.
//!
//! Environment:
//! - `KV_URL` (fallback `REDIS_URL`): store URL, e.g. `rediss://default:pw@host:6379`
//! - `KVKIT_CONNECT_TIMEOUT_MS` (default 5000)
//! - `KVKIT_OP_TIMEOUT_MS` (unset: no per-call deadline)

use crate::{Error, ErrorContext, Result};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const SUPPORTED_SCHEMES: [&str; 4] = ["redis", "rediss", "redis+unix", "unix"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvConfig {
    pub url: String,
    pub connect_timeout: Duration,
    /// Deadline applied to each store call, if any.
    pub operation_timeout: Option<Duration>,
}

impl KvConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            operation_timeout: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Load from the process environment and validate.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable source (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("KV_URL")
            .or_else(|| lookup("REDIS_URL"))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                Error::configuration_with_context(
                    "no key-value store URL configured",
                    ErrorContext::new()
                        .with_field_path("KV_URL")
                        .with_details("set KV_URL or REDIS_URL")
                        .with_source("config"),
                )
            })?;

        let connect_ms = parse_millis(&lookup, "KVKIT_CONNECT_TIMEOUT_MS")?;
        let op_ms = parse_millis(&lookup, "KVKIT_OP_TIMEOUT_MS")?;

        let mut config = Self::new(url.trim());
        if let Some(ms) = connect_ms {
            config = config.with_connect_timeout(Duration::from_millis(ms.max(1)));
        }
        if let Some(ms) = op_ms.filter(|ms| *ms > 0) {
            config = config.with_operation_timeout(Duration::from_millis(ms));
        }
        config.validate()?;
        Ok(config)
    }

    /// Check that the URL parses and names a supported scheme.
    pub fn validate(&self) -> Result<()> {
        let parsed = Url::parse(&self.url).map_err(|e| {
            Error::configuration_with_context(
                "invalid key-value store URL",
                ErrorContext::new()
                    .with_field_path("KV_URL")
                    .with_details(e.to_string())
                    .with_source("config"),
            )
        })?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            return Err(Error::configuration_with_context(
                format!("unsupported URL scheme '{}'", parsed.scheme()),
                ErrorContext::new()
                    .with_field_path("KV_URL")
                    .with_details(format!("expected one of {}", SUPPORTED_SCHEMES.join(", ")))
                    .with_source("config"),
            ));
        }
        Ok(())
    }

    /// The URL with any password replaced by `***`, for logs.
    pub fn redacted_url(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut parsed) if parsed.password().is_some() => {
                if parsed.set_password(Some("***")).is_ok() {
                    parsed.to_string()
                } else {
                    "<redacted>".to_string()
                }
            }
            Ok(parsed) => parsed.to_string(),
            Err(_) => "<unparsable url>".to_string(),
        }
    }
}

fn parse_millis<F>(lookup: &F, name: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
            Error::configuration_with_context(
                "expected a whole number of milliseconds",
                ErrorContext::new()
                    .with_field_path(name)
                    .with_details(format!("got '{}'", raw))
                    .with_source("config"),
            )
        }),
    }
}

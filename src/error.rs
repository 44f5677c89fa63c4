use thiserror::Error;

/// Boxed error produced by caller-supplied computations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured error context for configuration problems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Setting that caused the error (e.g., "KV_URL", "KVKIT_OP_TIMEOUT_MS")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected format, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "config", "redis_store")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the key-value utility layer.
///
/// Nothing in this crate retries or swallows these; every variant reaches
/// the immediate caller, which owns the fail-open / fail-closed decision.
#[derive(Debug, Error)]
pub enum Error {
    /// The store could not be reached or answered with a protocol error.
    #[error("Key-value store unavailable during {operation}: {message}")]
    StoreUnavailable {
        operation: &'static str,
        message: String,
    },

    /// The computation handed to the read-through cache failed.
    #[error("Fetch for cache key '{key}' failed: {source}")]
    FetchFailed { key: String, source: BoxError },

    /// A rate-limit rejection converted into an error ("too many requests").
    #[error("Rate limit exceeded for '{identifier}': {limit} requests per {window_secs}s")]
    RateLimited {
        identifier: String,
        limit: u64,
        window_secs: u64,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn store_unavailable(operation: &'static str, message: impl Into<String>) -> Self {
        Error::StoreUnavailable {
            operation,
            message: message.into(),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn is_store_unavailable(&self) -> bool {
        matches!(self, Error::StoreUnavailable { .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// HTTP status a request handler would answer with for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::RateLimited { .. } => 429,
            Error::StoreUnavailable { .. } => 503,
            _ => 500,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }
}

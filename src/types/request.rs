//! Request descriptors and per-call options.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde_json::Value;

use super::signature::RequestSignature;

/// Default deadline for one exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default time-to-live for cached responses.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// HTTP method of a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call overrides for a single request.
///
/// Unset fields fall back to the descriptor defaults:
///
/// ```rust
/// # use huginn::RequestOptions;
/// # use std::time::Duration;
/// let options = RequestOptions::new()
///     .timeout(Duration::from_secs(5))
///     .cache(false);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub timeout: Option<Duration>,
    pub retry: Option<bool>,
    pub max_retries: Option<u32>,
    pub cache: Option<bool>,
    pub cache_ttl: Option<Duration>,
    pub headers: HashMap<String, String>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the exchange deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Enable or disable retries for this request.
    pub fn retry(mut self, enabled: bool) -> Self {
        self.retry = Some(enabled);
        self
    }

    /// Set the number of retries after the initial attempt.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Enable or disable response caching for this request.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    /// Set the time-to-live of the cached response.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// A fully-resolved request: what one exchange needs, plus the dispatch
/// policy that governs caching and retries.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub headers: HashMap<String, String>,
    pub timeout: Duration,
    pub retry_enabled: bool,
    pub max_retries: u32,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
}

impl RequestDescriptor {
    /// Descriptor with the default policy: 15s deadline, 3 retries,
    /// caching only for GET, 5 minute TTL.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
            retry_enabled: true,
            max_retries: DEFAULT_MAX_RETRIES,
            cache_enabled: method == Method::Get,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Apply per-call overrides on top of the defaults.
    pub fn apply(mut self, options: RequestOptions) -> Self {
        if let Some(timeout) = options.timeout {
            self.timeout = timeout;
        }
        if let Some(retry) = options.retry {
            self.retry_enabled = retry;
        }
        if let Some(n) = options.max_retries {
            self.max_retries = n;
        }
        if let Some(cache) = options.cache {
            self.cache_enabled = cache;
        }
        if let Some(ttl) = options.cache_ttl {
            self.cache_ttl = ttl;
        }
        self.headers.extend(options.headers);
        self
    }

    /// Canonical fingerprint used for both the cache key and the dedup key.
    pub fn signature(&self) -> RequestSignature {
        RequestSignature::compute(self.method, &self.path, self.body.as_ref())
    }
}

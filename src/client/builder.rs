//! Builder for configuring client instances.

use std::sync::Arc;

use super::ApiClient;
use crate::cache::{CacheConfig, ResponseCache};
use crate::credentials::{CredentialStore, MemoryCredentialStore};
use crate::error::{ApiError, Result};
use crate::queue::{DEFAULT_ADMISSION_LIMIT, RequestQueue};
use crate::retry::RetryConfig;
use crate::transport::{Exchange, HttpTransport};

/// Builder for [`ApiClient`] instances.
pub struct ApiClientBuilder {
    base_url: Option<String>,
    credentials: Arc<dyn CredentialStore>,
    transport: Option<Arc<dyn Exchange>>,
    retry: RetryConfig,
    cache: CacheConfig,
    admission_limit: usize,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            credentials: Arc::new(MemoryCredentialStore::new()),
            transport: None,
            retry: RetryConfig::default(),
            cache: CacheConfig::default(),
            admission_limit: DEFAULT_ADMISSION_LIMIT,
        }
    }

    /// Backend base URL (scheme + host, optionally a path prefix).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Credential store consulted for the bearer token on every exchange.
    pub fn credentials(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = store;
        self
    }

    /// Replace the HTTP transport entirely (stubs in tests, alternative
    /// stacks). When set, `base_url` and `credentials` are unused.
    pub fn transport(mut self, transport: Arc<dyn Exchange>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Default retry policy; per-request options can narrow it.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// Ceiling on concurrently admitted requests. Default: 5.
    pub fn admission_limit(mut self, limit: usize) -> Self {
        self.admission_limit = limit;
        self
    }

    pub fn build(self) -> Result<ApiClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let base_url = self.base_url.ok_or_else(|| ApiError::Validation {
                    message: "no base URL configured".into(),
                    field: None,
                })?;
                Arc::new(HttpTransport::new(base_url, self.credentials))
            }
        };
        let cache = Arc::new(ResponseCache::new(&self.cache));

        // Reclaim expired entries nobody re-reads. Skipped outside a
        // runtime; expiry on read still holds.
        let sweeper = tokio::runtime::Handle::try_current().ok().map(|handle| {
            let cache = Arc::clone(&cache);
            let period = self.cache.sweep_interval;
            handle.spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.tick().await; // first tick completes immediately
                loop {
                    ticker.tick().await;
                    cache.sweep().await;
                }
            })
        });

        Ok(ApiClient {
            transport,
            cache,
            queue: RequestQueue::new(self.admission_limit),
            retry: self.retry,
            sweeper,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

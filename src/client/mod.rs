//! The dispatch core: cache → queue → retry → transport.

mod builder;

pub use builder::ApiClientBuilder;

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::ResponseCache;
use crate::error::Result;
use crate::queue::RequestQueue;
use crate::retry::{RetryConfig, with_retry};
use crate::telemetry;
use crate::transport::Exchange;
use crate::types::{
    Method, ProgressFn, RequestDescriptor, RequestOptions, ResponseBody, UploadPayload,
};

/// Client for one logical backend, owning its cache and dedup queue.
///
/// Construct via [`ApiClient::builder`]. Each instance is isolated:
/// separate clients never share cached responses or in-flight state, so
/// tests get fresh instances and an app can talk to several backends at
/// once.
pub struct ApiClient {
    transport: Arc<dyn Exchange>,
    cache: Arc<ResponseCache>,
    queue: RequestQueue,
    retry: RetryConfig,
    sweeper: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("retry", &self.retry)
            .field("sweeper", &self.sweeper)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new builder for configuring a client.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Result<T> {
        self.dispatch(Method::Get, path, None, options).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Option<Value>>,
        options: RequestOptions,
    ) -> Result<T> {
        self.dispatch(Method::Post, path, body.into(), options).await
    }

    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Option<Value>>,
        options: RequestOptions,
    ) -> Result<T> {
        self.dispatch(Method::Put, path, body.into(), options).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: impl Into<Option<Value>>,
        options: RequestOptions,
    ) -> Result<T> {
        self.dispatch(Method::Patch, path, body.into(), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.dispatch(Method::Delete, path, None, options).await
    }

    /// Upload a file, bypassing cache and queue entirely.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: UploadPayload,
        on_progress: Option<ProgressFn>,
    ) -> Result<T> {
        let result = self.transport.upload(path, payload, on_progress).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::UPLOADS_TOTAL, "status" => status).increment(1);
        result?.json()
    }

    /// Remove cached responses whose signature matches `pattern` (a
    /// regular expression over `METHOD path` keys); with `None`, clear
    /// the whole cache.
    pub fn invalidate_cache(&self, pattern: Option<&str>) -> Result<()> {
        self.cache.invalidate(pattern)
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<T> {
        let mut descriptor = RequestDescriptor::new(method, path).apply(options);
        descriptor.body = body;
        self.request(descriptor).await?.json()
    }

    /// Untyped dispatch: cache lookup, deduplicated admission, retried
    /// exchanges, cache write-back.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<ResponseBody> {
        let started = Instant::now();
        let method = descriptor.method;
        let signature = descriptor.signature();
        let cacheable = descriptor.cache_enabled && method == Method::Get;
        let cache_ttl = descriptor.cache_ttl;

        if cacheable && let Some(body) = self.cache.get(signature.as_str()).await {
            debug!(signature = %signature, "cache hit, skipping exchange");
            return Ok(body);
        }

        let retry = if descriptor.retry_enabled {
            self.retry.clone().max_retries(descriptor.max_retries)
        } else {
            RetryConfig::disabled()
        };
        let transport = Arc::clone(&self.transport);
        let descriptor = Arc::new(descriptor);
        let operation = async move {
            with_retry(&retry, descriptor.method.as_str(), || {
                let transport = Arc::clone(&transport);
                let descriptor = Arc::clone(&descriptor);
                async move { transport.exchange(&descriptor).await }
            })
            .await
        };
        let result = self.queue.admit(&signature, operation).await;

        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(
            telemetry::REQUESTS_TOTAL,
            "method" => method.as_str(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "method" => method.as_str())
            .record(started.elapsed().as_secs_f64());

        if cacheable && let Ok(body) = &result {
            self.cache
                .insert(signature.as_str().to_owned(), body.clone(), cache_ttl)
                .await;
        }
        result
    }
}

impl Drop for ApiClient {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

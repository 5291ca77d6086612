//! One network exchange: deadline, credential injection, decoding,
//! classification.
//!
//! [`HttpTransport`] performs a single request/response exchange. A
//! deadline firing before completion classifies as a timeout, distinct
//! from a connection-level failure. Non-2xx responses are converted to
//! classified errors using the backend's best-effort error envelope;
//! success bodies are decoded once, here, by their declared content kind.
//!
//! The upload path shares the transport's credential injection but sets
//! no explicit content type, so the multipart boundary is negotiated by
//! the HTTP stack.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::credentials::CredentialStore;
use crate::error::{ApiError, Result};
use crate::types::{Method, ProgressFn, RequestDescriptor, ResponseBody, UploadPayload};

/// Deadline for the upload channel; large payloads outlive the request
/// default.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Upload chunk size; each chunk advances the progress callback.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// A single request/response exchange.
///
/// The seam between the dispatch pipeline and the network: tests
/// substitute counting or failing implementations, production uses
/// [`HttpTransport`].
#[async_trait]
pub trait Exchange: Send + Sync {
    /// Perform one exchange for `descriptor`, honouring its deadline.
    async fn exchange(&self, descriptor: &RequestDescriptor) -> Result<ResponseBody>;

    /// Multipart upload with progress reporting. Not deduplicated, not
    /// cached, not retried.
    async fn upload(
        &self,
        path: &str,
        payload: UploadPayload,
        on_progress: Option<ProgressFn>,
    ) -> Result<ResponseBody>;
}

/// Error envelope the backend returns on non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    error: Option<String>,
    field: Option<String>,
}

/// reqwest-backed transport with bearer-token injection.
pub struct HttpTransport {
    http: Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialStore>) -> Self {
        let http = Client::builder()
            .build()
            .expect("failed to build HTTP client");
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Classify a non-2xx response, decoding the error envelope
    /// best-effort for the message.
    async fn classify_failure(&self, response: Response) -> ApiError {
        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        let bytes = response.bytes().await.unwrap_or_default();
        let envelope: ErrorEnvelope = serde_json::from_slice(&bytes).unwrap_or_default();
        let message = envelope
            .message
            .or(envelope.error)
            .or_else(|| {
                if bytes.is_empty() {
                    None
                } else {
                    Some(String::from_utf8_lossy(&bytes).into_owned())
                }
            })
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            });

        if status.as_u16() == 401 {
            // The token is known invalid; it must be gone before the
            // caller can react, or an immediate retry would loop on it.
            self.credentials.clear_token();
        }

        warn!(status = status.as_u16(), message = %message, "exchange failed");
        ApiError::from_status(status.as_u16(), message, envelope.field, retry_after)
    }

    /// Decode a success body by its declared content kind.
    async fn decode(response: Response) -> Result<ResponseBody> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read response body: {e}")))?;

        if content_type.starts_with("application/json") || content_type.contains("+json") {
            if bytes.is_empty() {
                return Ok(ResponseBody::Json(Value::Null));
            }
            let value = serde_json::from_slice(&bytes)
                .map_err(|e| ApiError::Network(format!("failed to decode response body: {e}")))?;
            Ok(ResponseBody::Json(value))
        } else if content_type.starts_with("text/") {
            Ok(ResponseBody::Text(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        } else if bytes.is_empty() {
            // 204-style responses carry neither body nor content type
            Ok(ResponseBody::Json(Value::Null))
        } else {
            Ok(ResponseBody::Binary(bytes.to_vec()))
        }
    }

    fn map_send_error(error: reqwest::Error, deadline: Duration) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(deadline)
        } else {
            ApiError::Network(error.to_string())
        }
    }
}

#[async_trait]
impl Exchange for HttpTransport {
    async fn exchange(&self, descriptor: &RequestDescriptor) -> Result<ResponseBody> {
        let method = match descriptor.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };
        let mut request = self
            .http
            .request(method, self.url(&descriptor.path))
            .timeout(descriptor.timeout);
        request = self.authorize(request);
        for (name, value) in &descriptor.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &descriptor.body {
            request = request.json(body);
        }

        debug!(method = %descriptor.method, path = %descriptor.path, "dispatching exchange");
        let response = request
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, descriptor.timeout))?;

        if response.status().is_success() {
            Self::decode(response).await
        } else {
            Err(self.classify_failure(response).await)
        }
    }

    async fn upload(
        &self,
        path: &str,
        payload: UploadPayload,
        on_progress: Option<ProgressFn>,
    ) -> Result<ResponseBody> {
        let total = payload.data.len();
        let part = if total == 0 {
            Part::bytes(Vec::new())
        } else {
            let chunks: Vec<Vec<u8>> = payload
                .data
                .chunks(UPLOAD_CHUNK_SIZE)
                .map(<[u8]>::to_vec)
                .collect();
            let mut sent = 0usize;
            let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
                sent += chunk.len();
                if let Some(report) = &on_progress {
                    report((sent * 100 / total) as u8);
                }
                Ok::<_, Infallible>(chunk)
            }));
            Part::stream_with_length(Body::wrap_stream(stream), total as u64)
        };
        // No explicit content type on the request: the multipart boundary
        // is negotiated by the HTTP stack.
        let form = Form::new().part("file", part.file_name(payload.file_name));

        let request = self
            .authorize(self.http.post(self.url(path)))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form);

        debug!(path, bytes = total, "dispatching upload");
        let response = request
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, UPLOAD_TIMEOUT))?;

        if response.status().is_success() {
            Self::decode(response).await
        } else {
            Err(self.classify_failure(response).await)
        }
    }
}

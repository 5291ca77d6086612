//! Huginn - resilient request core for REST backends
//!
//! One client object mediates every call to a backend: it deduplicates
//! concurrent identical requests, caches idempotent reads with per-entry
//! expiry, retries transient failures with bounded exponential backoff,
//! classifies every failure into a stable taxonomy, and exposes a
//! progress-reporting upload path.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{ApiClient, RequestOptions};
//! use serde_json::{Value, json};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let client = ApiClient::builder()
//!         .base_url("https://api.example.com")
//!         .build()?;
//!
//!     // Cached for five minutes; concurrent identical calls share one
//!     // exchange.
//!     let profile: Value = client.get("/users/42", RequestOptions::default()).await?;
//!
//!     // Mutations are never cached; failures arrive classified.
//!     let sent: Value = client
//!         .post(
//!             "/messages",
//!             json!({ "to": 7, "text": "hi" }),
//!             RequestOptions::default(),
//!         )
//!         .await?;
//!
//!     println!("{profile} {sent}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod credentials;
pub mod error;
pub mod queue;
pub mod retry;
pub mod telemetry;
pub mod transport;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResponseCache};
pub use client::{ApiClient, ApiClientBuilder};
pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use error::{ApiError, ErrorKind, Result};
pub use queue::RequestQueue;
pub use retry::RetryConfig;
pub use transport::{Exchange, HttpTransport};
pub use types::{
    Method, ProgressFn, RequestDescriptor, RequestOptions, RequestSignature, ResponseBody,
    UploadPayload,
};

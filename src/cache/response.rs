//! Time-boxed response cache with pattern invalidation.
//!
//! [`ResponseCache`] stores decoded responses of idempotent reads under
//! their canonical request signature. Each entry carries its own
//! time-to-live; an expired entry is never returned, no matter how the
//! read races eviction.
//!
//! # Architecture
//!
//! The cache sits in [`ApiClient`](crate::ApiClient), above the dedup
//! queue. A cache hit bypasses admission, retry logic, and the transport
//! entirely. Cache hit/miss metrics are emitted separately.
//!
//! # Invalidation
//!
//! Mutations invalidate reads by pattern: the cache key embeds
//! `METHOD path`, so a regular expression over paths removes exactly the
//! entries it matches. `invalidate(None)` clears everything.
//!
//! Expired entries nobody re-reads are reclaimed by a periodic sweep
//! (driven by the owning client at [`CacheConfig::sweep_interval`]), so
//! worst-case memory stays bounded by live traffic.

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use regex::Regex;
use tracing::debug;

use crate::error::{ApiError, Result};
use crate::telemetry;
use crate::types::ResponseBody;

/// Configuration for the response cache.
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(10_000)
///     .sweep_interval(Duration::from_secs(300));
/// ```
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of cached entries. Default: 10,000.
    pub max_entries: u64,
    /// Period of the background sweep reclaiming expired entries that are
    /// never read again. Default: 5 minutes.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            sweep_interval: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached entries.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    /// Set the period of the background sweep.
    pub fn sweep_interval(mut self, period: Duration) -> Self {
        self.sweep_interval = period;
        self
    }
}

#[derive(Clone)]
struct CacheEntry {
    body: ResponseBody,
    ttl: Duration,
}

/// Expiry policy reading each entry's own time-to-live.
struct PerEntryTtl;

impl Expiry<String, CacheEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory response cache keyed by canonical request signature.
///
/// Uses moka's async LRU cache with a per-entry expiry policy. See module
/// docs for the invalidation and sweep behaviour.
pub struct ResponseCache {
    cache: Cache<String, CacheEntry>,
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();
        Self { cache }
    }

    /// Look up a cached response.
    ///
    /// Returns `None` both when absent and when present-but-expired.
    /// Emits cache hit/miss metrics.
    pub async fn get(&self, key: &str) -> Option<ResponseBody> {
        match self.cache.get(key).await {
            Some(entry) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                Some(entry.body)
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Insert a response with its own time-to-live.
    pub async fn insert(&self, key: String, body: ResponseBody, ttl: Duration) {
        self.cache.insert(key, CacheEntry { body, ttl }).await;
    }

    /// Remove every entry whose key matches `pattern` (a regular
    /// expression); with `None`, clear everything.
    pub fn invalidate(&self, pattern: Option<&str>) -> Result<()> {
        match pattern {
            Some(pattern) => {
                let matcher = Regex::new(pattern).map_err(|e| ApiError::Validation {
                    message: format!("invalid invalidation pattern: {e}"),
                    field: None,
                })?;
                debug!(pattern, "invalidating cache entries");
                self.cache
                    .invalidate_entries_if(move |key, _| matcher.is_match(key))
                    .expect("invalidation closures enabled at construction");
            }
            None => {
                debug!("clearing response cache");
                self.cache.invalidate_all();
            }
        }
        Ok(())
    }

    /// Drive pending maintenance so expired and invalidated entries are
    /// reclaimed without waiting for a read.
    pub async fn sweep(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Number of resident entries, after pending maintenance.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

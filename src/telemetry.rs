//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `method` — HTTP method of the dispatched request (e.g. "GET")
//! - `operation` — pipeline stage emitting the metric
//! - `status` — outcome: "ok" or "error"

/// Total requests dispatched through the client (cache hits excluded).
///
/// Labels: `method`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// Request duration in seconds, cache lookup through settlement.
///
/// Labels: `method`.
pub const REQUEST_DURATION_SECONDS: &str = "huginn_request_duration_seconds";

/// Total transient failures observed by the retry controller.
///
/// Labels: `operation`.
pub const RETRIES_TOTAL: &str = "huginn_retries_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total response cache misses.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total callers that attached to an already in-flight request.
pub const DEDUP_JOINS_TOTAL: &str = "huginn_dedup_joins_total";

/// Total uploads dispatched through the upload channel.
///
/// Labels: `status` ("ok" | "error").
pub const UPLOADS_TOTAL: &str = "huginn_uploads_total";

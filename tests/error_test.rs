//! Tests for [`ApiError`] classification — status mapping, retryability,
//! retry-after extraction.

use std::time::Duration;

use huginn::{ApiError, ErrorKind};

fn classify(status: u16) -> ApiError {
    ApiError::from_status(status, "boom".into(), None, None)
}

// ============================================================================
// Status → kind mapping
// ============================================================================

#[test]
fn status_table_maps_to_kinds() {
    assert_eq!(classify(400).kind(), ErrorKind::Validation);
    assert_eq!(classify(401).kind(), ErrorKind::Authentication);
    assert_eq!(classify(403).kind(), ErrorKind::Forbidden);
    assert_eq!(classify(404).kind(), ErrorKind::NotFound);
    assert_eq!(classify(429).kind(), ErrorKind::RateLimited);
    assert_eq!(classify(500).kind(), ErrorKind::Server);
    assert_eq!(classify(502).kind(), ErrorKind::Unavailable);
    assert_eq!(classify(503).kind(), ErrorKind::Unavailable);
    assert_eq!(classify(504).kind(), ErrorKind::Unavailable);
}

#[test]
fn unlisted_statuses_stay_in_the_taxonomy() {
    // other 4xx are caller mistakes, other 5xx are the backend's fault
    assert_eq!(classify(418).kind(), ErrorKind::Validation);
    assert_eq!(classify(599).kind(), ErrorKind::Server);
}

// ============================================================================
// Retryability
// ============================================================================

#[test]
fn transient_kinds_are_retryable() {
    assert!(classify(429).is_transient());
    assert!(classify(500).is_transient());
    assert!(classify(503).is_transient());
    assert!(ApiError::Network("connection refused".into()).is_transient());
    assert!(ApiError::Timeout(Duration::from_secs(15)).is_transient());
}

#[test]
fn permanent_kinds_are_not_retryable() {
    assert!(!classify(400).is_transient());
    assert!(!classify(401).is_transient());
    assert!(!classify(403).is_transient());
    assert!(!classify(404).is_transient());
}

// ============================================================================
// Status codes and payload details
// ============================================================================

#[test]
fn status_codes_round_trip() {
    assert_eq!(classify(500).status_code(), Some(500));
    assert_eq!(classify(503).status_code(), Some(503));
    assert_eq!(
        ApiError::Timeout(Duration::from_secs(1)).status_code(),
        Some(408)
    );
    assert_eq!(ApiError::Network("dns".into()).status_code(), None);
}

#[test]
fn retry_after_extracted_from_rate_limited() {
    let err = ApiError::from_status(429, "slow down".into(), None, Some(Duration::from_secs(5)));
    assert_eq!(err.retry_after(), Some(Duration::from_secs(5)));
    assert_eq!(classify(429).retry_after(), None);
    assert_eq!(classify(500).retry_after(), None);
}

#[test]
fn validation_carries_offending_field() {
    let err = ApiError::from_status(400, "title is required".into(), Some("title".into()), None);
    assert_eq!(err.field(), Some("title"));
    assert_eq!(classify(404).field(), None);
}

#[test]
fn kind_names_are_stable() {
    assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
    assert_eq!(ErrorKind::RateLimited.to_string(), "rate_limited");
    assert_eq!(ErrorKind::Unavailable.to_string(), "unavailable");
}

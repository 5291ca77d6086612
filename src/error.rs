//! Huginn error types

use std::fmt;
use std::time::Duration;

/// Failure kind; retryability is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Forbidden,
    NotFound,
    RateLimited,
    Server,
    Unavailable,
    Network,
    Timeout,
}

impl ErrorKind {
    /// Transient kinds the retry controller may absorb.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Server | Self::Unavailable | Self::Network | Self::Timeout
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::Server => "server",
            Self::Unavailable => "unavailable",
            Self::Network => "network",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Huginn error types
///
/// Classified once where a raw transport failure or non-2xx status is first
/// observed, and never remapped afterwards. `Clone` so a deduplicated
/// in-flight request can deliver the same failure to every attached caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        /// Offending field reported by the backend, if any.
        field: Option<String>,
    },

    #[error("authentication failed: {message}")]
    Authentication { message: String },

    #[error("forbidden: {message}")]
    Forbidden { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("service unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    /// Map a non-2xx status to its classified error.
    ///
    /// Unlisted 4xx statuses are treated as validation failures, unlisted
    /// 5xx as server errors, so every response stays inside the taxonomy.
    pub fn from_status(
        status: u16,
        message: String,
        field: Option<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        match status {
            400 => Self::Validation { message, field },
            401 => Self::Authentication { message },
            403 => Self::Forbidden { message },
            404 => Self::NotFound { message },
            429 => Self::RateLimited {
                message,
                retry_after,
            },
            502 | 503 | 504 => Self::Unavailable { status, message },
            500..=599 => Self::Server { status, message },
            _ => Self::Validation { message, field },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Server { .. } => ErrorKind::Server,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::Network(_) => ErrorKind::Network,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }

    /// Whether the retry controller may absorb this error.
    pub fn is_transient(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Server-provided backoff hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Effective HTTP status of the failure, where one applies.
    ///
    /// A fired deadline reports 408; a connection-level failure has none.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Validation { .. } => Some(400),
            Self::Authentication { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::NotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Unavailable { status, .. } => Some(*status),
            Self::Network(_) => None,
            Self::Timeout(_) => Some(408),
        }
    }

    /// Offending field reported by a validation failure.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            _ => None,
        }
    }
}

/// Result type alias for Huginn operations
pub type Result<T> = std::result::Result<T, ApiError>;

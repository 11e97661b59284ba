//! Error types exposed by the GitHub crawl layer.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::rate_limit::RateLimitInfo;

/// Coarse failure class used for retry decisions and outcome reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Network failure, timeout, or server error; retried with backoff.
    Transient,
    /// Explicit throttling; waited out and retried.
    RateLimited,
    /// Point budget exhausted with no usable reset time.
    RateLimitUnavailable,
    /// Response did not match the expected schema.
    Malformed,
    /// Repository (or nested entity) does not exist.
    NotFound,
    /// Repository is not visible to the credential.
    Forbidden,
    /// The credential itself was rejected.
    Unauthorized,
    /// The walk exceeded its configured page cap.
    PageCapExceeded,
    /// The output tables could not be read or written.
    Storage,
}

impl FailureClass {
    /// Returns the snake-case label used in reports and telemetry.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::RateLimited => "rate_limited",
            Self::RateLimitUnavailable => "rate_limit_unavailable",
            Self::Malformed => "malformed",
            Self::NotFound => "not_found",
            Self::Forbidden => "forbidden",
            Self::Unauthorized => "unauthorized",
            Self::PageCapExceeded => "page_cap_exceeded",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure of a single GraphQL request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Timeout, connection reset, or 5xx response.
    #[error("transient failure during {operation}: {message}")]
    Transient {
        /// Query that failed.
        operation: String,
        /// Transport or server detail.
        message: String,
    },

    /// GitHub asked the client to slow down.
    #[error("rate limited during {operation}: {message}")]
    RateLimited {
        /// Query that was throttled.
        operation: String,
        /// Delay requested through `Retry-After`, when present.
        retry_after: Option<Duration>,
        /// True when the primary point budget is exhausted rather than a
        /// secondary (abuse) limit being hit.
        budget_exhausted: bool,
        /// Rate limit headers returned alongside the refusal.
        rate_limit: Option<RateLimitInfo>,
        /// Message returned by GitHub.
        message: String,
    },

    /// The point budget is exhausted and no reset time is known.
    #[error("GitHub rate limit exhausted and no reset time is available")]
    RateLimitUnavailable,

    /// Response body did not decode into the expected schema.
    #[error("unexpected response shape for {operation}: {message}")]
    Malformed {
        /// Query whose response was rejected.
        operation: String,
        /// Decoder or classification detail.
        message: String,
    },

    /// Repository or entity does not exist (deleted, renamed, or never existed).
    #[error("not found: {message}")]
    NotFound {
        /// Message returned by GitHub.
        message: String,
    },

    /// Repository exists but the token may not read it.
    #[error("access forbidden: {message}")]
    Forbidden {
        /// Message returned by GitHub.
        message: String,
    },

    /// The personal access token was rejected.
    #[error("GitHub rejected the token: {message}")]
    Unauthorized {
        /// Message returned by GitHub.
        message: String,
    },
}

impl FetchError {
    /// Returns the failure class for this error.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Transient { .. } => FailureClass::Transient,
            Self::RateLimited { .. } => FailureClass::RateLimited,
            Self::RateLimitUnavailable => FailureClass::RateLimitUnavailable,
            Self::Malformed { .. } => FailureClass::Malformed,
            Self::NotFound { .. } => FailureClass::NotFound,
            Self::Forbidden { .. } => FailureClass::Forbidden,
            Self::Unauthorized { .. } => FailureClass::Unauthorized,
        }
    }

    /// Returns true when the repository should be skipped rather than failed.
    #[must_use]
    pub const fn is_inaccessible(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Forbidden { .. })
    }

    /// Returns true when the failure must stop the whole run.
    #[must_use]
    pub const fn is_run_fatal(&self) -> bool {
        matches!(self, Self::RateLimitUnavailable | Self::Unauthorized { .. })
    }

    pub(crate) fn malformed(operation: &str, message: impl Into<String>) -> Self {
        Self::Malformed {
            operation: operation.to_owned(),
            message: message.into(),
        }
    }

    pub(crate) fn transient(operation: &str, message: impl Into<String>) -> Self {
        Self::Transient {
            operation: operation.to_owned(),
            message: message.into(),
        }
    }
}

/// Errors raised while parsing a repository identifier.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TargetError {
    /// The input was empty after trimming.
    #[error("repository identifier is empty")]
    Empty,

    /// The input looked like a URL but could not be parsed.
    #[error("repository URL is invalid: {0}")]
    InvalidUrl(String),

    /// The URL points somewhere other than GitHub.
    #[error("repository URL must point at github.com, got host `{host}`")]
    UnsupportedHost {
        /// Host found in the URL.
        host: String,
    },

    /// The path did not contain both owner and name.
    #[error("repository identifier must look like owner/name: `{input}`")]
    MissingPathSegments {
        /// Offending input.
        input: String,
    },

    /// A bare `owner/name` carried further path segments.
    #[error("repository identifier has extra path segments (use a URL for deep links): `{input}`")]
    ExtraPathSegments {
        /// Offending input.
        input: String,
    },

    /// The owner or name contained characters GitHub does not allow.
    #[error("invalid repository segment `{segment}`")]
    InvalidSegment {
        /// Offending owner or name segment.
        segment: String,
    },
}

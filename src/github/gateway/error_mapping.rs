//! Classification of GitHub failures into [`FetchError`] classes.

use http::{HeaderMap, StatusCode};

use crate::github::error::FetchError;
use crate::github::models::api::GraphQlError;
use crate::github::rate_limit::RateLimitInfo;

use super::http_utils::{extract_github_message, retry_after};

/// Checks if an octocrab error represents a network/transport issue.
pub(super) const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

/// Checks whether a refusal message describes secondary (abuse) throttling.
fn mentions_secondary_limit(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("secondary rate limit") || lowered.contains("abuse")
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> FetchError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return classify_status(
            operation,
            source.status_code,
            &HeaderMap::new(),
            Some(source.message.clone()),
        );
    }

    if is_network_error(error) {
        return FetchError::transient(operation, error.to_string());
    }

    FetchError::malformed(operation, error.to_string())
}

/// Classifies a non-success HTTP response.
pub(super) fn classify_status(
    operation: &str,
    status: StatusCode,
    headers: &HeaderMap,
    maybe_message: Option<String>,
) -> FetchError {
    let message = maybe_message.unwrap_or_else(|| status.to_string());
    let rate_limit = RateLimitInfo::from_headers(headers);

    match status {
        StatusCode::UNAUTHORIZED => FetchError::Unauthorized { message },
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let delay = retry_after(headers);
            if delay.is_some() || mentions_secondary_limit(&message) {
                FetchError::RateLimited {
                    operation: operation.to_owned(),
                    retry_after: delay,
                    budget_exhausted: false,
                    rate_limit,
                    message,
                }
            } else if rate_limit.is_some_and(|info| info.is_exhausted()) {
                FetchError::RateLimited {
                    operation: operation.to_owned(),
                    retry_after: None,
                    budget_exhausted: true,
                    rate_limit,
                    message,
                }
            } else if status == StatusCode::TOO_MANY_REQUESTS {
                FetchError::RateLimited {
                    operation: operation.to_owned(),
                    retry_after: None,
                    budget_exhausted: false,
                    rate_limit,
                    message,
                }
            } else {
                FetchError::Forbidden { message }
            }
        }
        StatusCode::NOT_FOUND => FetchError::NotFound { message },
        other if other.is_server_error() => {
            FetchError::transient(operation, format!("GitHub returned {other}: {message}"))
        }
        other => FetchError::malformed(operation, format!("unexpected status {other}: {message}")),
    }
}

/// Extracts the message of an error body, for use with [`classify_status`].
pub(super) fn error_body_message(body: &str) -> Option<String> {
    extract_github_message(body).or_else(|| {
        let trimmed = body.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    })
}

/// Classifies the `errors` array of a GraphQL response.
///
/// The most actionable class wins: throttling, then inaccessibility, then
/// GitHub's own timeouts, and anything unrecognised is treated as schema
/// drift.
pub(super) fn classify_graphql_errors(
    operation: &str,
    errors: &[GraphQlError],
    headers: &HeaderMap,
) -> FetchError {
    let message = errors
        .iter()
        .map(|error| error.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    let has_type = |expected: &str| {
        errors
            .iter()
            .any(|error| error.kind.as_deref() == Some(expected))
    };

    if has_type("RATE_LIMITED") {
        return FetchError::RateLimited {
            operation: operation.to_owned(),
            retry_after: retry_after(headers),
            budget_exhausted: true,
            rate_limit: RateLimitInfo::from_headers(headers),
            message,
        };
    }
    if has_type("NOT_FOUND") {
        return FetchError::NotFound { message };
    }
    if has_type("FORBIDDEN") {
        return FetchError::Forbidden { message };
    }

    let lowered = message.to_lowercase();
    if lowered.contains("timeout") || lowered.contains("something went wrong") {
        return FetchError::transient(operation, message);
    }

    FetchError::malformed(operation, message)
}

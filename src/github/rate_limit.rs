//! Rate limit information from GitHub GraphQL responses.
//!
//! GitHub meters GraphQL queries in points. Every query issued by the crawler
//! selects `rateLimit { limit cost remaining resetAt }`, and the same values
//! are mirrored in the `X-RateLimit-*` response headers. `RateLimitInfo`
//! captures whichever source was available so the budget tracker can refresh
//! its view of the shared quota after each request.

use http::HeaderMap;

/// Rate limit information extracted from a GitHub API response.
///
/// # Example
///
/// ```
/// use devtalk::RateLimitInfo;
///
/// let info = RateLimitInfo::new(5000, 4999, Some(1_700_000_000)).with_cost(Some(1));
/// assert!(!info.is_exhausted());
/// assert_eq!(info.remaining(), 4999);
/// assert_eq!(info.cost(), Some(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Maximum points allowed in the current window.
    limit: u32,
    /// Remaining points in the current window.
    remaining: u32,
    /// Unix timestamp when the window resets, if reported.
    reset_at: Option<u64>,
    /// Points charged for the query that produced this snapshot.
    cost: Option<u32>,
}

impl RateLimitInfo {
    /// Creates a new rate limit info instance.
    #[must_use]
    pub const fn new(limit: u32, remaining: u32, reset_at: Option<u64>) -> Self {
        Self {
            limit,
            remaining,
            reset_at,
            cost: None,
        }
    }

    /// Attaches the measured cost of the query.
    #[must_use]
    pub const fn with_cost(mut self, cost: Option<u32>) -> Self {
        self.cost = cost;
        self
    }

    /// Returns the maximum points allowed in the current window.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns the remaining points in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Returns the Unix timestamp when the window resets.
    #[must_use]
    pub const fn reset_at(&self) -> Option<u64> {
        self.reset_at
    }

    /// Returns the measured cost of the query, when GitHub reported one.
    #[must_use]
    pub const fn cost(&self) -> Option<u32> {
        self.cost
    }

    /// Returns true if the budget has been exhausted.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Reads the `X-RateLimit-*` headers, returning `None` unless both the
    /// limit and remaining headers are present and numeric.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let limit = header_number::<u32>(headers, "x-ratelimit-limit")?;
        let remaining = header_number::<u32>(headers, "x-ratelimit-remaining")?;
        let reset_at = header_number::<u64>(headers, "x-ratelimit-reset");
        Some(Self::new(limit, remaining, reset_at))
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<T>().ok())
}

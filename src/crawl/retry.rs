//! Backoff policy for transient request failures.

use std::future::Future;
use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBuilder};

use crate::github::error::FetchError;
use crate::github::query::QueryShape;
use crate::telemetry::{CrawlEvent, TelemetrySink, duration_ms};

use super::budget::RateBudget;
use super::error::WalkError;

/// Default initial backoff delay in milliseconds.
pub const DEFAULT_MIN_BACKOFF_MS: u64 = 1_000;
/// Default backoff ceiling in milliseconds.
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;
/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 5;

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(DEFAULT_MIN_BACKOFF_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub const fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub const fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }
}

/// Runs one request until it succeeds or fails permanently.
///
/// Every attempt is admitted through the budget first. Transient failures
/// back off and consume the retry budget; throttling is waited out through
/// the budget and retried without consuming it; every other class returns
/// immediately.
pub(crate) async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    budget: &RateBudget,
    shape: QueryShape,
    operation: &str,
    telemetry: &dyn TelemetrySink,
    mut attempt: F,
) -> Result<T, WalkError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut delays = config.clone().into_backoff().build();
    let mut attempts: usize = 0;

    loop {
        budget.admit(shape).await?;
        attempts = attempts.saturating_add(1);

        let error = match attempt().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match error {
            FetchError::Transient { .. } => {
                let Some(delay) = delays.next() else {
                    return Err(WalkError::RetriesExhausted {
                        attempts,
                        source: error,
                    });
                };
                tracing::warn!(
                    operation,
                    attempt = attempts,
                    delay_ms = duration_ms(delay),
                    "transient failure; retrying: {error}"
                );
                telemetry.record(CrawlEvent::RetryScheduled {
                    operation: operation.to_owned(),
                    attempt: attempts,
                    delay_ms: duration_ms(delay),
                    message: error.to_string(),
                });
                tokio::time::sleep(delay).await;
            }
            FetchError::RateLimited { .. } => {
                budget.wait_out(&error).await?;
            }
            other => return Err(WalkError::Fetch(other)),
        }
    }
}

//! Crawl telemetry events and sinks.
//!
//! Long crawls are mostly spent waiting on GitHub, so the crawler emits a
//! structured event at each pair boundary, page fetch, retry, and rate limit
//! wait. Events complement the `tracing` log stream with a machine-readable
//! record of where the time went.

use std::io;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted by the crawler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CrawlEvent {
    /// A (repository, entity kind) pair started walking.
    PairStarted {
        /// `owner/name` of the repository.
        repository: String,
        /// Entity kind label.
        entity_kind: String,
    },
    /// A page of entities or comments was fetched.
    PageFetched {
        /// `owner/name` of the repository.
        repository: String,
        /// GraphQL operation name.
        operation: String,
        /// Rows decoded from the page.
        rows: usize,
        /// Points remaining after the page, when reported.
        remaining: Option<u32>,
    },
    /// A transient failure will be retried after a backoff delay.
    RetryScheduled {
        /// GraphQL operation name.
        operation: String,
        /// One-based retry number.
        attempt: usize,
        /// Backoff delay in milliseconds.
        delay_ms: u64,
        /// Failure that triggered the retry.
        message: String,
    },
    /// The crawler paused for the rate limit.
    RateLimitWait {
        /// Why the pause was taken.
        reason: WaitReason,
        /// Pause length in milliseconds.
        delay_ms: u64,
    },
    /// A pair reached its final outcome.
    PairFinished {
        /// `owner/name` of the repository.
        repository: String,
        /// Entity kind label.
        entity_kind: String,
        /// Outcome label (`completed`, `skipped_existing`, ...).
        outcome: String,
    },
}

/// Cause of a rate limit pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitReason {
    /// The next query would dip below the safety margin.
    BudgetLow,
    /// GitHub refused a query with an explicit throttling signal.
    Throttled,
}

/// Converts a delay into whole milliseconds for event payloads.
#[must_use]
pub fn duration_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: CrawlEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: CrawlEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
///
/// This is intended for local debugging and is not transmitted anywhere.
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: CrawlEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

/// Test sink that keeps every event in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    events: std::sync::Mutex<Vec<CrawlEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn take(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .expect("events mutex should be available")
            .drain(..)
            .collect()
    }
}

#[cfg(test)]
impl TelemetrySink for RecordingSink {
    fn record(&self, event: CrawlEvent) {
        self.events
            .lock()
            .expect("events mutex should be available")
            .push(event);
    }
}

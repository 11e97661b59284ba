//! Error types raised while walking pairs and running a crawl.

use thiserror::Error;

use crate::github::error::{FailureClass, FetchError};
use crate::github::models::EntityKind;
use crate::sink::SinkError;

use super::report::{CrawlReport, PairOutcome};

/// Failure that ends the walk of one (repository, entity kind) pair.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalkError {
    /// A request failed with a class that is not retried.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Transient failures persisted past the retry budget.
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Requests issued, including the first.
        attempts: usize,
        /// Last failure observed.
        source: FetchError,
    },

    /// An entity vanished between its top-level page and a follow-up
    /// comment page, so its comment set cannot be completed.
    #[error("entity disappeared while its comments were being fetched: {0}")]
    EntityVanished(FetchError),

    /// The walk reached its configured page cap.
    #[error("walk exceeded the cap of {cap} {connection} pages")]
    PageCapExceeded {
        /// Cap that was reached.
        cap: usize,
        /// `entity` or `comment`.
        connection: &'static str,
    },
}

impl WalkError {
    /// Failure class recorded in the crawl report.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::Fetch(error)
            | Self::EntityVanished(error)
            | Self::RetriesExhausted { source: error, .. } => error.class(),
            Self::PageCapExceeded { .. } => FailureClass::PageCapExceeded,
        }
    }

    /// Returns true when the pair should be skipped rather than failed.
    ///
    /// Only a top-level page can mark the repository inaccessible; a missing
    /// entity behind a comment page fails the pair instead.
    #[must_use]
    pub const fn is_inaccessible(&self) -> bool {
        matches!(self, Self::Fetch(error) if error.is_inaccessible())
    }

    /// Returns true when the failure must stop the whole run.
    #[must_use]
    pub const fn is_run_fatal(&self) -> bool {
        matches!(self, Self::Fetch(error) if error.is_run_fatal())
    }
}

/// Failure that stops the whole crawl.
#[derive(Debug, Error)]
pub enum RunError {
    /// A pair hit a failure that would repeat for every other pair.
    #[error("{repository} {entity_kind}: {class}: {message}")]
    Fatal {
        /// `owner/name` of the repository being walked.
        repository: String,
        /// Entity kind being walked.
        entity_kind: EntityKind,
        /// Failure class.
        class: FailureClass,
        /// Failure detail.
        message: String,
    },

    /// The output directory could not be read or written.
    #[error("{repository} {entity_kind}: {source}")]
    Sink {
        /// `owner/name` of the repository being written.
        repository: String,
        /// Entity kind being written.
        entity_kind: EntityKind,
        /// Underlying I/O failure.
        source: SinkError,
    },

    /// A worker task panicked or was cancelled.
    #[error("crawl worker failed: {message}")]
    Worker {
        /// Join error detail.
        message: String,
    },
}

impl RunError {
    /// Outcome to record for the pair that stopped the run.
    ///
    /// Returns `None` for worker failures, which cannot be tied to a pair.
    #[must_use]
    pub fn pair_outcome(&self) -> Option<PairOutcome> {
        match self {
            Self::Fatal { class, message, .. } => Some(PairOutcome::Failed {
                class: *class,
                message: message.clone(),
            }),
            Self::Sink { source, .. } => Some(PairOutcome::Failed {
                class: FailureClass::Storage,
                message: source.to_string(),
            }),
            Self::Worker { .. } => None,
        }
    }
}

/// Run-fatal failure together with everything completed before it.
#[derive(Debug, Error)]
#[error("crawl aborted: {error}")]
pub struct RunAborted {
    /// Outcomes of every pair attempted, including the one that aborted.
    pub report: CrawlReport,
    /// Why the crawl stopped.
    #[source]
    pub error: Box<RunError>,
}

//! Top-level error type surfaced by the `devtalk` binary.

use thiserror::Error;

use crate::crawl::RunAborted;
use crate::github::error::{FetchError, TargetError};
use crate::sink::SinkError;

/// Everything that can stop a `devtalk` command.
#[derive(Debug, Error)]
pub enum DevtalkError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// No token source provided a value.
    #[error(
        "personal access token is required (use --token, --token-file, DEVTALK_TOKEN, or GITHUB_TOKEN)"
    )]
    MissingToken,

    /// The token file could not be used.
    #[error("token file '{path}': {message}")]
    TokenFile {
        /// Path of the token file.
        path: String,
        /// What went wrong.
        message: String,
    },

    /// Local I/O outside the table store failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// A repository identifier given on the command line is invalid.
    #[error(transparent)]
    Target(#[from] TargetError),

    /// A single GitHub request failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The output directory could not be read or written.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The crawl stopped on a run-fatal failure.
    #[error(transparent)]
    Aborted(Box<RunAborted>),
}

impl From<RunAborted> for DevtalkError {
    fn from(aborted: RunAborted) -> Self {
        Self::Aborted(Box::new(aborted))
    }
}

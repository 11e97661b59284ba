//! Errors raised while reading or writing output tables.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Local storage failure on the output directory.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A filesystem operation failed.
    #[error("failed to {action} '{path}': {source}")]
    Io {
        /// What was being attempted (`create`, `open`, `sync`, ...).
        action: &'static str,
        /// Path the operation targeted.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A table could not be encoded or decoded as CSV.
    #[error("CSV error in '{path}': {source}")]
    Csv {
        /// Table path.
        path: Utf8PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
}

impl SinkError {
    pub(crate) fn io(action: &'static str, path: impl Into<Utf8PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<Utf8PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

//! Error types for archive ledger operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the archive ledger.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Query against the archive database failed.
    #[error("archive database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Legacy archive file could not be read.
    #[error("failed to read legacy archive '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Legacy archive file is not the expected JSON shape.
    #[error("legacy archive '{path}' is not valid: {source}")]
    LegacyFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A stored row could not be mapped back to a record.
    #[error("corrupt archive row for '{id}': {reason}")]
    CorruptRow { id: String, reason: String },
}

impl ArchiveError {
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn corrupt_row(id: &str, reason: impl Into<String>) -> Self {
        Self::CorruptRow {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

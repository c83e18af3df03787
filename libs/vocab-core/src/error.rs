//! Error types for vocab-core.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using VocabError.
pub type Result<T> = std::result::Result<T, VocabError>;

/// Errors reported by the vocabulary engine.
#[derive(Debug, Error)]
pub enum VocabError {
    #[error("cannot read word list {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write word list {}: {source}", path.display())]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: u64, reason: String },

    #[error("unknown word: {0}")]
    UnknownWord(String),

    #[error("invalid mastery level: {0}")]
    InvalidLevel(i64),
}

impl VocabError {
    /// Whether a session can continue after this error.
    ///
    /// Only a malformed source is treated as fatal for start-up; everything
    /// else degrades or is rejected without touching the store.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::MalformedRecord { .. })
    }
}

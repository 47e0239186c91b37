//! Shared error types for the services crate.

use std::path::PathBuf;

use thiserror::Error;

use quiz_core::model::{QuestionBankError, ScoreError, SessionError};
use storage::repository::StorageError;

/// Broad class of a conversation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Storage,
    Computation,
}

/// Errors produced while handling a single conversation turn.
///
/// The `Display` text of each variant is what the user sees; the engine never
/// lets these escape a turn.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConversationError {
    #[error("Answer cannot be empty.")]
    EmptyAnswer,
    #[error("Error: {0}")]
    Session(#[from] SessionError),
    #[error("Error: {0}")]
    Storage(#[from] StorageError),
    #[error("Error calculating score: {0}")]
    Score(#[from] ScoreError),
}

impl ConversationError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyAnswer => ErrorKind::Validation,
            Self::Session(_) | Self::Storage(_) => ErrorKind::Storage,
            Self::Score(_) => ErrorKind::Computation,
        }
    }
}

/// Errors emitted while loading quiz configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Bank(#[from] QuestionBankError),
    #[error("welcome message cannot be empty")]
    EmptyWelcome,
}

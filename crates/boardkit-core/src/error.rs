//! Error types for the few fallible operations the engine exposes.
//!
//! Mutations targeting missing ids silently no-op and never surface here;
//! errors are reserved for document decode and corrupted persisted state.

use thiserror::Error;

/// Errors surfaced to callers of the board API.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

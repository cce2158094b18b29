//! Error types for board operations

use thiserror::Error;

/// Errors that can occur while reading or writing a board
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Automerge error: {0}")]
    Automerge(#[from] automerge::AutomergeError),

    #[error("Failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field type for {0}")]
    InvalidType(String),

    #[error("Invalid board ID: {0}")]
    InvalidBoardId(String),

    #[error("Cannot merge board {found} into board {expected}")]
    BoardMismatch { expected: String, found: String },

    #[error("Malformed presence message: {0}")]
    MalformedPresence(#[source] serde_json::Error),
}

/// Result type for board operations
pub type BoardResult<T> = Result<T, BoardError>;

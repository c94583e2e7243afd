//! Error types for the document model

use crate::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Node not found at path {0:?}")]
    NodeNotFound(Path),

    #[error("Node not found for key: {0}")]
    KeyNotFound(String),

    #[error("Node at path {0:?} is not a text node")]
    NotText(Path),

    #[error("Node at path {0:?} cannot have children")]
    NotElement(Path),

    #[error("Offset {offset} is out of bounds for text of length {len} at {path:?}")]
    OffsetOutOfBounds { path: Path, offset: usize, len: usize },

    #[error("Text at {path:?} offset {offset} is {found:?}, expected {expected:?}")]
    TextMismatch {
        path: Path,
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unknown operation type: {0}")]
    UnknownOperation(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Json(e.to_string())
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

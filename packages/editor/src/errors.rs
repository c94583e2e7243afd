//! Error types for the editor

use folio_model::{ModelError, Path};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error(
        "Schema rules could not normalize node {key} at {path:?} after {iterations} iterations"
    )]
    NormalizationBudgetExceeded {
        key: String,
        path: Path,
        iterations: usize,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl EditorError {
    /// True for errors that point at a broken rule set or engine bug rather
    /// than at bad caller input
    pub fn is_programming_error(&self) -> bool {
        matches!(self, EditorError::NormalizationBudgetExceeded { .. })
    }
}

/// Result type for editor operations
pub type EditorResult<T> = Result<T, EditorError>;

use thiserror::Error;

/// Errors raised by the note model, the store layer and the panel board.
///
/// None of these are fatal to the application. Mapper problems are mostly
/// recovered by defaulting, store failures are reported to the UI, and
/// state conflicts are logged and ignored.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NoteError {
    #[error("Malformed document: {reason}")]
    Schema { reason: String },

    #[error("Unparseable {field} value: {value}")]
    Format { field: String, value: String },

    #[error("Store failure on {path}: {reason}")]
    Store { path: String, reason: String },

    #[error("Rejected: {reason}")]
    StateConflict { reason: String },

    #[error("Invalid store path: {path}")]
    InvalidPath { path: String },
}

impl NoteError {
    pub fn schema(reason: impl Into<String>) -> Self {
        Self::Schema {
            reason: reason.into(),
        }
    }

    pub fn format(field: impl Into<String>, value: impl ToString) -> Self {
        Self::Format {
            field: field.into(),
            value: value.to_string(),
        }
    }

    pub fn store(path: impl ToString, reason: impl ToString) -> Self {
        Self::Store {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::StateConflict {
            reason: reason.into(),
        }
    }

    /// Whether the error came from the store rather than from local state.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store { .. })
    }
}

pub type NoteResult<T> = Result<T, NoteError>;

//! Error types for the board engine

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur while loading, mutating, or persisting a board
#[derive(Debug, Error)]
pub enum BoardError {
    /// Document text could not be parsed into a board
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Column not found
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// Card not found
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Duplicate ID
    #[error("duplicate {item_type} ID: {id}")]
    DuplicateId { item_type: String, id: String },

    /// Invalid field value
    #[error("invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// The write collaborator refused the serialized document
    #[error("failed to persist document: {message}")]
    PersistFailure { message: String },

    /// The user declined to supply required input
    #[error("prompt cancelled")]
    PromptCancelled,

    /// File watcher failure
    #[error("watch error: {message}")]
    Watch { message: String },

    /// Configuration could not be loaded
    #[error("config error: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoardError {
    /// Create a parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate ID error
    pub fn duplicate_id(item_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::DuplicateId {
            item_type: item_type.into(),
            id: id.into(),
        }
    }

    /// Create a persist failure from any displayable cause
    pub fn persist(cause: impl std::fmt::Display) -> Self {
        Self::PersistFailure {
            message: cause.to_string(),
        }
    }

    /// Check if this error means "the message referenced something that isn't there
    /// or carried an unacceptable value". These are dropped, never surfaced.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound { .. }
                | Self::CardNotFound { .. }
                | Self::DuplicateId { .. }
                | Self::InvalidValue { .. }
        )
    }

    /// Check if this is a not-found error for a stale identifier
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ColumnNotFound { .. } | Self::CardNotFound { .. })
    }
}

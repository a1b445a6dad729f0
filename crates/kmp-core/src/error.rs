//! Error types for KMP.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KmpError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Failure reported by the active-window lifecycle manager. The reason
    /// is passed through to callers unchanged.
    #[error("{reason}")]
    LifecycleFailed { reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl KmpError {
    pub fn validation(message: impl Into<String>) -> Self {
        KmpError::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        KmpError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

pub type KmpResult<T> = Result<T, KmpError>;

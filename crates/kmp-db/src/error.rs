//! Database-specific error types and conversions.

use kmp_core::error::KmpError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Corrupt record: {0}")]
    Decode(String),
}

impl From<DbError> for KmpError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => KmpError::NotFound { entity, id },
            other => KmpError::Database(other.to_string()),
        }
    }
}

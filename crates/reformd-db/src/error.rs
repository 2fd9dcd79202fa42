//! Database-specific error types and conversions.

use reformd_core::error::ReformdError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed {entity} row: {reason}")]
    Decode { entity: String, reason: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for ReformdError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ReformdError::NotFound { entity, id },
            other => ReformdError::Database(other.to_string()),
        }
    }
}

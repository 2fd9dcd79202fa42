//! Error types for the Re:Formd waitlist.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReformdError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("Too many requests. Try again shortly.")]
    RateLimited,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Email delivery is not configured: {0}")]
    NotifierConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ReformdResult<T> = Result<T, ReformdError>;

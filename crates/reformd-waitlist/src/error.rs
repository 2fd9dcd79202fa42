//! Waitlist error types.

use reformd_core::error::ReformdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaitlistError {
    #[error("Email is required.")]
    MissingEmail,

    #[error("Invalid email address.")]
    InvalidEmail,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl From<WaitlistError> for ReformdError {
    fn from(err: WaitlistError) -> Self {
        match err {
            WaitlistError::MissingEmail | WaitlistError::InvalidEmail => ReformdError::Validation {
                message: err.to_string(),
            },
            WaitlistError::RateLimited => ReformdError::RateLimited,
            WaitlistError::Timeout(_) => ReformdError::Database(err.to_string()),
        }
    }
}

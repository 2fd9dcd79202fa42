//! Mail-layer error types and conversions.

use reformd_core::error::ReformdError;

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("{0} is required")]
    NotConfigured(&'static str),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl From<MailError> for ReformdError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::NotConfigured(_) => ReformdError::NotifierConfig(err.to_string()),
            MailError::Client(e) => ReformdError::Internal(e.to_string()),
        }
    }
}

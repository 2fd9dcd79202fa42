//! Outbound email delivery.

use crate::error::ReformdResult;

/// A single transactional email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Outcome of a delivery attempt the provider actually saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { id: String },
    Failed { reason: String },
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

/// Email delivery capability.
///
/// A transient or provider-side failure is `Ok(Delivery::Failed)`.
/// `Err` is reserved for a missing or broken delivery configuration
/// ([`ReformdError::NotifierConfig`]).
///
/// [`ReformdError::NotifierConfig`]: crate::error::ReformdError::NotifierConfig
pub trait Notifier: Send + Sync {
    fn send(&self, email: OutgoingEmail) -> impl Future<Output = ReformdResult<Delivery>> + Send;
}

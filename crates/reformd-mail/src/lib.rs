//! Re:Formd Mail — Transactional email delivery through Resend.

mod error;
mod resend;

pub use error::MailError;
pub use resend::{ResendConfig, ResendNotifier};

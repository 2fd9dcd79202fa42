//! Re:Formd Waitlist — Signup intake, rate limiting, verification
//! tokens, and the double opt-in confirmation flow.

pub mod config;
pub mod email;
pub mod error;
pub mod input;
pub mod rate_limit;
pub mod service;
pub mod token;

pub use config::WaitlistConfig;
pub use error::WaitlistError;
pub use rate_limit::RateLimiter;
pub use service::{
    RequestContext, SubmitInput, SubmitOutput, VerifyOutcome, WaitlistService,
};

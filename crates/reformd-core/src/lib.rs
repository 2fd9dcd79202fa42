//! Re:Formd Core — Shared domain models, error types, and the
//! collaborator traits the waitlist is written against.

pub mod error;
pub mod models;
pub mod notifier;
pub mod repository;

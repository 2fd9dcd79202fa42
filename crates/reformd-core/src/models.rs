//! Domain models for the Re:Formd waitlist.

pub mod signup;

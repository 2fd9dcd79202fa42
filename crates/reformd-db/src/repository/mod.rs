//! SurrealDB repository implementations.

mod signup;

pub use signup::SurrealSignupRepository;

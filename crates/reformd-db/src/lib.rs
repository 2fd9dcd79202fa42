//! Re:Formd Database — SurrealDB connection management, schema
//! migrations, and the signup repository.

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbCredentials, DbManager};
pub use error::DbError;
pub use repository::SurrealSignupRepository;
pub use schema::run_migrations;

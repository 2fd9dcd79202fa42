//! Repository trait for signup persistence.
//!
//! Lookups report a missing record as [`ReformdError::NotFound`], the
//! same way every other read in the system does.
//!
//! [`ReformdError::NotFound`]: crate::error::ReformdError::NotFound

use chrono::{DateTime, Utc};

use crate::error::ReformdResult;
use crate::models::signup::{Signup, UpsertSignup};

pub trait SignupRepository: Send + Sync {
    fn get_by_email(&self, email: &str) -> impl Future<Output = ReformdResult<Signup>> + Send;

    /// Resolve a token digest to its signup, matching either the
    /// outstanding digest or the digest that completed verification.
    fn get_by_token_digest(
        &self,
        token_digest: &str,
    ) -> impl Future<Output = ReformdResult<Signup>> + Send;

    /// Insert-or-update keyed by email. Concurrent upserts for the same
    /// email resolve last-write-wins in the store.
    fn upsert(&self, input: UpsertSignup) -> impl Future<Output = ReformdResult<Signup>> + Send;

    /// Compare-and-set promotion to verified: applies only to the
    /// unverified record whose outstanding digest still equals
    /// `token_digest`. Returns `NotFound` when nothing matched.
    fn mark_verified(
        &self,
        token_digest: &str,
        verified_at: DateTime<Utc>,
    ) -> impl Future<Output = ReformdResult<Signup>> + Send;
}

//! Waitlist signup domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Self-reported profile answers from the waitlist form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupProfile {
    pub full_name: Option<String>,
    pub age_bracket: Option<String>,
    pub gender: Option<String>,
    pub goal: Option<String>,
    pub biggest_issue: Option<String>,
    pub timeframe: Option<String>,
    pub notes: Option<String>,
}

/// Marketing attribution captured at submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    pub source: Option<String>,
    pub landing_url: Option<String>,
    pub referrer: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
}

/// An outstanding verification token. The digest and expiry only ever
/// exist together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    /// SHA-256 hex digest of the raw token.
    pub token_digest: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingVerification {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationState {
    Unverified,
    Pending,
    Verified,
}

/// A waitlist signup, keyed by normalized email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signup {
    pub email: String,
    pub profile: SignupProfile,
    pub attribution: Attribution,
    pub pending: Option<PendingVerification>,
    /// Digest of the token that promoted this record to verified.
    /// Lets a repeated click on the same link resolve the record.
    pub verified_token_digest: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Signup {
    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    pub fn state(&self) -> VerificationState {
        match (&self.verified_at, &self.pending) {
            (Some(_), _) => VerificationState::Verified,
            (None, Some(_)) => VerificationState::Pending,
            (None, None) => VerificationState::Unverified,
        }
    }
}

/// Insert-or-update payload keyed by `email`.
///
/// Profile and attribution are always written (absent values become
/// null). `pending` is only written when `Some`; `None` leaves the
/// stored verification state untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertSignup {
    pub email: String,
    pub profile: SignupProfile,
    pub attribution: Attribution,
    pub pending: Option<PendingVerification>,
}

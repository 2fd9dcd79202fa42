//! SurrealDB implementation of [`SignupRepository`].
//!
//! Each signup is stored at `signup:⟨email⟩`, so upserts for the same
//! address always land on the same record.

use chrono::{DateTime, Utc};
use reformd_core::error::ReformdResult;
use reformd_core::models::signup::{
    Attribution, PendingVerification, Signup, SignupProfile, UpsertSignup,
};
use reformd_core::repository::SignupRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SignupRow {
    email: String,
    full_name: Option<String>,
    age_bracket: Option<String>,
    gender: Option<String>,
    goal: Option<String>,
    biggest_issue: Option<String>,
    timeframe: Option<String>,
    notes: Option<String>,
    source: Option<String>,
    landing_url: Option<String>,
    referrer: Option<String>,
    utm_source: Option<String>,
    utm_medium: Option<String>,
    utm_campaign: Option<String>,
    utm_content: Option<String>,
    utm_term: Option<String>,
    verification_token_digest: Option<String>,
    verification_expires_at: Option<DateTime<Utc>>,
    verified_token_digest: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SignupRow {
    fn try_into_signup(self) -> Result<Signup, DbError> {
        let pending = match (self.verification_token_digest, self.verification_expires_at) {
            (Some(token_digest), Some(expires_at)) => Some(PendingVerification {
                token_digest,
                expires_at,
            }),
            (None, None) => None,
            _ => {
                return Err(DbError::Decode {
                    entity: "signup".into(),
                    reason: format!(
                        "{}: token digest and expiry must be set together",
                        self.email
                    ),
                });
            }
        };

        Ok(Signup {
            email: self.email,
            profile: SignupProfile {
                full_name: self.full_name,
                age_bracket: self.age_bracket,
                gender: self.gender,
                goal: self.goal,
                biggest_issue: self.biggest_issue,
                timeframe: self.timeframe,
                notes: self.notes,
            },
            attribution: Attribution {
                source: self.source,
                landing_url: self.landing_url,
                referrer: self.referrer,
                utm_source: self.utm_source,
                utm_medium: self.utm_medium,
                utm_campaign: self.utm_campaign,
                utm_content: self.utm_content,
                utm_term: self.utm_term,
            },
            pending,
            verified_token_digest: self.verified_token_digest,
            verified_at: self.verified_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn first_signup(rows: Vec<SignupRow>, id: impl FnOnce() -> String) -> Result<Signup, DbError> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DbError::NotFound {
            entity: "signup".into(),
            id: id(),
        })?
        .try_into_signup()
}

/// SurrealDB implementation of the signup repository.
#[derive(Clone)]
pub struct SurrealSignupRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSignupRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SignupRepository for SurrealSignupRepository<C> {
    async fn get_by_email(&self, email: &str) -> ReformdResult<Signup> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('signup', $email)")
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SignupRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_signup(rows, || email.to_string())?)
    }

    async fn get_by_token_digest(&self, token_digest: &str) -> ReformdResult<Signup> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM signup \
                 WHERE verification_token_digest = $digest \
                 OR verified_token_digest = $digest \
                 LIMIT 1",
            )
            .bind(("digest", token_digest.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SignupRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_signup(rows, || "token_digest=<redacted>".to_string())?)
    }

    async fn upsert(&self, input: UpsertSignup) -> ReformdResult<Signup> {
        let mut sets = vec![
            "email = $email",
            "full_name = $full_name",
            "age_bracket = $age_bracket",
            "gender = $gender",
            "goal = $goal",
            "biggest_issue = $biggest_issue",
            "timeframe = $timeframe",
            "notes = $notes",
            "source = $source",
            "landing_url = $landing_url",
            "referrer = $referrer",
            "utm_source = $utm_source",
            "utm_medium = $utm_medium",
            "utm_campaign = $utm_campaign",
            "utm_content = $utm_content",
            "utm_term = $utm_term",
        ];
        if input.pending.is_some() {
            sets.push("verification_token_digest = $token_digest");
            sets.push("verification_expires_at = $expires_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPSERT type::record('signup', $email) SET {}",
            sets.join(", ")
        );

        let UpsertSignup {
            email,
            profile,
            attribution,
            pending,
        } = input;

        let mut builder = self
            .db
            .query(&query)
            .bind(("email", email.clone()))
            .bind(("full_name", profile.full_name))
            .bind(("age_bracket", profile.age_bracket))
            .bind(("gender", profile.gender))
            .bind(("goal", profile.goal))
            .bind(("biggest_issue", profile.biggest_issue))
            .bind(("timeframe", profile.timeframe))
            .bind(("notes", profile.notes))
            .bind(("source", attribution.source))
            .bind(("landing_url", attribution.landing_url))
            .bind(("referrer", attribution.referrer))
            .bind(("utm_source", attribution.utm_source))
            .bind(("utm_medium", attribution.utm_medium))
            .bind(("utm_campaign", attribution.utm_campaign))
            .bind(("utm_content", attribution.utm_content))
            .bind(("utm_term", attribution.utm_term));

        if let Some(pending) = pending {
            builder = builder
                .bind(("token_digest", pending.token_digest))
                .bind(("expires_at", pending.expires_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SignupRow> = result.take(0).map_err(DbError::from)?;
        debug!(email = %email, "Upserted signup");
        Ok(first_signup(rows, || email)?)
    }

    async fn mark_verified(
        &self,
        token_digest: &str,
        verified_at: DateTime<Utc>,
    ) -> ReformdResult<Signup> {
        let result = self
            .db
            .query(
                "UPDATE signup SET \
                 verified_at = $verified_at, \
                 verified_token_digest = $digest, \
                 verification_token_digest = NONE, \
                 verification_expires_at = NONE, \
                 updated_at = time::now() \
                 WHERE verification_token_digest = $digest \
                 AND verified_at IS NONE",
            )
            .bind(("digest", token_digest.to_string()))
            .bind(("verified_at", verified_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SignupRow> = result.take(0).map_err(DbError::from)?;
        Ok(first_signup(rows, || "token_digest=<redacted>".to_string())?)
    }
}

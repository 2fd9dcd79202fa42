//! Verification token issuance and hashing.
//!
//! The raw token only ever travels inside the emailed link; the store
//! keeps its SHA-256 digest.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

/// A freshly issued verification token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Raw token for the emailed link. Never persisted.
    pub token: String,
    /// Hex SHA-256 of `token`.
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

/// Generate a cryptographically random token (32 bytes, hex-encoded).
pub fn generate_verification_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    hex::encode(bytes)
}

/// SHA-256 hash of a raw verification token, hex-encoded.
pub fn hash_verification_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Issue a new token valid for `lifetime_secs` from `now`.
pub fn issue(now: DateTime<Utc>, lifetime_secs: u64) -> IssuedToken {
    let token = generate_verification_token();
    let digest = hash_verification_token(&token);
    IssuedToken {
        token,
        digest,
        expires_at: now + Duration::seconds(lifetime_secs as i64),
    }
}

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored form of one refresh token. `token_hash` is an Argon2 PHC string;
/// the plaintext secret is never persisted.
#[derive(Debug, Clone, FromRow)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub subject_id: String,
    pub token_hash: String,
    pub valid: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub invalidated_at: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// Usable for a refresh as of `now`
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.valid && self.expires_at > now
    }
}

use crate::domain::auth::{
    CredentialRecord, RefreshToken, RefreshTokenHasher, TokenStore, ValidatedCredential,
};
use crate::domain::shared::RequestContext;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Credential store kept in process memory.
///
/// Same contract as the Postgres store; the map lock stands in for the
/// per-subject transaction. Nothing survives a restart.
pub struct InMemoryRefreshTokenRepository {
    hasher: RefreshTokenHasher,
    refresh_ttl: Duration,
    records: Mutex<HashMap<Uuid, CredentialRecord>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new(hasher: RefreshTokenHasher, refresh_ttl: Duration) -> Self {
        Self {
            hasher,
            refresh_ttl,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of credentials currently flagged valid for a subject
    #[cfg(test)]
    pub(crate) fn valid_count(&self, subject_id: &str) -> usize {
        self.records
            .lock()
            .values()
            .filter(|r| r.subject_id == subject_id && r.valid)
            .count()
    }

    /// Every credential ever stored for a subject, oldest first
    #[cfg(test)]
    pub(crate) fn records_for(&self, subject_id: &str) -> Vec<CredentialRecord> {
        let mut records: Vec<CredentialRecord> = self
            .records
            .lock()
            .values()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at);
        records
    }
}

#[async_trait]
impl TokenStore for InMemoryRefreshTokenRepository {
    async fn save_token(
        &self,
        ctx: &RequestContext,
        subject_id: &str,
        token: &RefreshToken,
        replaces: Option<Uuid>,
    ) -> AppResult<()> {
        let token_hash = self.hasher.hash_blocking(token.secret()).await?;
        let now = Utc::now();

        let mut records = self.records.lock();

        if let Some(previous) = replaces {
            let still_valid = records
                .get(&previous)
                .map(|r| r.valid && r.subject_id == subject_id)
                .unwrap_or(false);
            if !still_valid {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    credential_id = %previous,
                    "Refresh token already rotated by a concurrent request"
                );
                return Err(AppError::InvalidRefreshToken);
            }
        }

        if records.contains_key(&token.id()) {
            return Err(AppError::Internal(format!(
                "credential id {} already stored",
                token.id()
            )));
        }

        for record in records
            .values_mut()
            .filter(|r| r.subject_id == subject_id && r.valid)
        {
            record.valid = false;
            record.invalidated_at = Some(now);
        }

        records.insert(
            token.id(),
            CredentialRecord {
                id: token.id(),
                subject_id: subject_id.to_string(),
                token_hash,
                valid: true,
                expires_at: now + self.refresh_ttl,
                created_at: now,
                invalidated_at: None,
            },
        );

        Ok(())
    }

    async fn validate_token(
        &self,
        _ctx: &RequestContext,
        presented: &str,
    ) -> AppResult<ValidatedCredential> {
        let token = RefreshToken::parse(presented).ok_or(AppError::InvalidRefreshToken)?;

        let record = self
            .records
            .lock()
            .get(&token.id())
            .filter(|r| r.is_usable_at(Utc::now()))
            .cloned()
            .ok_or(AppError::InvalidRefreshToken)?;

        if !self
            .hasher
            .verify_blocking(token.secret(), &record.token_hash)
            .await?
        {
            return Err(AppError::InvalidRefreshToken);
        }

        Ok(ValidatedCredential {
            credential_id: record.id,
            subject_id: record.subject_id,
        })
    }
}

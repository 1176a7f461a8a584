use crate::domain::auth::{
    CredentialRecord, RefreshToken, RefreshTokenHasher, TokenStore, ValidatedCredential,
};
use crate::domain::shared::RequestContext;
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Postgres-backed credential store.
///
/// Saves for one subject are serialized with a transaction-scoped advisory
/// lock keyed by the subject, so different subjects never wait on each other.
/// The partial unique index on `credentials(subject_id) WHERE valid` backs the
/// one-valid-credential rule at the schema level.
pub struct RefreshTokenRepository {
    pool: Arc<DbPool>,
    hasher: RefreshTokenHasher,
    refresh_ttl: Duration,
}

impl RefreshTokenRepository {
    pub fn new(pool: Arc<DbPool>, hasher: RefreshTokenHasher, refresh_ttl: Duration) -> Self {
        Self {
            pool,
            hasher,
            refresh_ttl,
        }
    }

    /// Find a valid (still flagged valid, non-expired) credential by id
    async fn find_valid(&self, id: Uuid) -> AppResult<Option<CredentialRecord>> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT id, subject_id, token_hash, valid, expires_at, created_at, invalidated_at
            FROM credentials
            WHERE id = $1
              AND valid
              AND expires_at > NOW()
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }
}

#[async_trait]
impl TokenStore for RefreshTokenRepository {
    async fn save_token(
        &self,
        ctx: &RequestContext,
        subject_id: &str,
        token: &RefreshToken,
        replaces: Option<Uuid>,
    ) -> AppResult<()> {
        // Hash before opening the transaction to keep the lock short.
        let token_hash = self.hasher.hash_blocking(token.secret()).await?;
        let now = Utc::now();
        let expires_at = now + self.refresh_ttl;

        // Dropped without commit (error, timeout, cancellation) means rollback.
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(subject_id)
            .execute(&mut *tx)
            .await?;

        if let Some(previous) = replaces {
            let consumed = sqlx::query(
                r#"
                UPDATE credentials
                SET valid = FALSE, invalidated_at = $3
                WHERE id = $1 AND subject_id = $2 AND valid
                "#,
            )
            .bind(previous)
            .bind(subject_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if consumed.rows_affected() == 0 {
                tx.rollback().await?;
                tracing::warn!(
                    request_id = %ctx.request_id,
                    credential_id = %previous,
                    "Refresh token already rotated by a concurrent request"
                );
                return Err(AppError::InvalidRefreshToken);
            }
        }

        sqlx::query(
            r#"
            UPDATE credentials
            SET valid = FALSE, invalidated_at = $2
            WHERE subject_id = $1 AND valid
            "#,
        )
        .bind(subject_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO credentials (id, subject_id, token_hash, valid, expires_at, created_at)
            VALUES ($1, $2, $3, TRUE, $4, $5)
            "#,
        )
        .bind(token.id())
        .bind(subject_id)
        .bind(&token_hash)
        .bind(expires_at)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            request_id = %ctx.request_id,
            credential_id = %token.id(),
            "Credential stored"
        );

        Ok(())
    }

    async fn validate_token(
        &self,
        ctx: &RequestContext,
        presented: &str,
    ) -> AppResult<ValidatedCredential> {
        let token = RefreshToken::parse(presented).ok_or(AppError::InvalidRefreshToken)?;

        let record = self
            .find_valid(token.id())
            .await?
            .ok_or(AppError::InvalidRefreshToken)?;

        if !record.valid {
            return Err(AppError::Internal(
                "credential store returned an invalidated record".to_string(),
            ));
        }

        if !self
            .hasher
            .verify_blocking(token.secret(), &record.token_hash)
            .await?
        {
            tracing::warn!(
                request_id = %ctx.request_id,
                credential_id = %record.id,
                "Refresh token secret mismatch"
            );
            return Err(AppError::InvalidRefreshToken);
        }

        Ok(ValidatedCredential {
            credential_id: record.id,
            subject_id: record.subject_id,
        })
    }
}

use super::{parse_bearer, JwtManager, RefreshTokenGenerator, TokenResponse, TokenStore};
use crate::{
    domain::shared::RequestContext,
    error::{AppError, AppResult},
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

const MAX_SUBJECT_LEN: usize = 255;

/// Issues token pairs and rotates refresh tokens.
///
/// Holds no mutable state of its own; every coordination concern between
/// concurrent requests is left to the [`TokenStore`].
pub struct AuthService {
    store: Arc<dyn TokenStore>,
    jwt: JwtManager,
    generator: RefreshTokenGenerator,
    store_timeout: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn TokenStore>,
        jwt: JwtManager,
        generator: RefreshTokenGenerator,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            jwt,
            generator,
            store_timeout,
        }
    }

    /// Create the first token pair for a subject authenticated elsewhere.
    /// Any refresh token the subject still holds stops working.
    pub async fn issue(&self, ctx: &RequestContext, subject_id: &str) -> AppResult<TokenResponse> {
        let span = tracing::info_span!(
            "issue_tokens",
            request_id = %ctx.request_id,
            subject_id = %subject_id,
        );

        async {
            validate_subject(subject_id)?;

            let response = self.mint(ctx, subject_id, None).await?;
            tracing::info!("Token pair issued");

            Ok::<_, AppError>(response)
        }
        .instrument(span)
        .await
    }

    /// Exchange the refresh token carried in `authorization` for a new pair
    pub async fn refresh(&self, ctx: &RequestContext, authorization: &str) -> AppResult<TokenResponse> {
        let span = tracing::info_span!(
            "refresh_tokens",
            request_id = %ctx.request_id,
            subject_id = tracing::field::Empty,
        );

        async {
            let presented = parse_bearer(authorization)?;

            let validated = self
                .with_store_timeout("validate_token", self.store.validate_token(ctx, presented))
                .await?;
            tracing::Span::current().record("subject_id", validated.subject_id.as_str());
            tracing::debug!(credential_id = %validated.credential_id, "Refresh token accepted");

            let response = self
                .mint(ctx, &validated.subject_id, Some(validated.credential_id))
                .await?;
            tracing::info!("Refresh token rotated");

            Ok::<_, AppError>(response)
        }
        .instrument(span)
        .await
    }

    async fn mint(
        &self,
        ctx: &RequestContext,
        subject_id: &str,
        replaces: Option<Uuid>,
    ) -> AppResult<TokenResponse> {
        let access_token = self.jwt.issue(subject_id)?;
        let refresh_token = self.generator.generate()?;

        self.with_store_timeout(
            "save_token",
            self.store.save_token(ctx, subject_id, &refresh_token, replaces),
        )
        .await?;

        Ok(TokenResponse {
            access_token,
            refresh_token: refresh_token.plaintext(),
            expires_in: self.jwt.ttl().num_seconds(),
        })
    }

    /// Bound a store call. Dropping the future on timeout rolls back any
    /// transaction it had open.
    async fn with_store_timeout<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.store_timeout, future).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Credential store call timed out"
                );
                Err(AppError::Timeout(format!("credential store {}", operation)))
            }
        }
    }
}

fn validate_subject(subject_id: &str) -> AppResult<()> {
    if subject_id.trim().is_empty() {
        return Err(AppError::BadRequest("guid is required".to_string()));
    }
    if subject_id.len() > MAX_SUBJECT_LEN {
        return Err(AppError::BadRequest(format!(
            "guid must be at most {} bytes",
            MAX_SUBJECT_LEN
        )));
    }
    Ok(())
}

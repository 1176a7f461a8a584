use super::RefreshToken;
use crate::{domain::shared::RequestContext, error::AppResult};
use async_trait::async_trait;
use uuid::Uuid;

/// A refresh token that matched a valid stored credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCredential {
    pub credential_id: Uuid,
    pub subject_id: String,
}

/// Durable store of refresh credentials.
///
/// Implementations must keep at most one valid credential per subject and
/// must apply `save_token` as a single atomic unit with respect to other
/// saves for the same subject.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Invalidate the subject's current credential and persist `token` as the
    /// new valid one.
    ///
    /// When `replaces` is set, the invalidate step only succeeds if that
    /// credential is still valid; otherwise nothing changes and the call fails
    /// with [`crate::error::AppError::InvalidRefreshToken`].
    async fn save_token(
        &self,
        ctx: &RequestContext,
        subject_id: &str,
        token: &RefreshToken,
        replaces: Option<Uuid>,
    ) -> AppResult<()>;

    /// Find the valid, unexpired credential matching a presented plaintext.
    ///
    /// # Errors
    /// [`crate::error::AppError::InvalidRefreshToken`] for any token that does
    /// not match, without saying why.
    async fn validate_token(
        &self,
        ctx: &RequestContext,
        presented: &str,
    ) -> AppResult<ValidatedCredential>;
}

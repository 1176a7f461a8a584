use crate::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign access token: {0}")]
    Signing(String),
    #[error("invalid access token: {0}")]
    Invalid(String),
    #[error("access token expired")]
    Expired,
    #[error("entropy source unavailable: {0}")]
    Entropy(String),
    #[error("failed to hash refresh token: {0}")]
    Hashing(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            // Access tokens never reach the refresh path; a failure here is ours.
            TokenError::Invalid(msg) => AppError::Internal(format!("invalid access token: {}", msg)),
            TokenError::Expired => AppError::Internal("access token expired".to_string()),
            TokenError::Signing(msg) => AppError::Internal(format!("signing: {}", msg)),
            TokenError::Entropy(msg) => AppError::Internal(format!("entropy: {}", msg)),
            TokenError::Hashing(msg) => AppError::Internal(format!("hashing: {}", msg)),
            TokenError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}

use crate::error::{AppError, AppResult};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the credential from an `Authorization` value of the form
/// `Bearer <token>`.
pub fn parse_bearer(authorization: &str) -> AppResult<&str> {
    let token = authorization
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| AppError::BadRequest("Invalid Authorization token format".to_string()))?;

    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(AppError::BadRequest(
            "Invalid Authorization token format".to_string(),
        ));
    }

    Ok(token)
}

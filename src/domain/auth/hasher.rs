use super::TokenError;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

/// Salted Argon2id transform for refresh secrets. Stored values are PHC
/// strings, so verification reads parameters and salt back from the hash.
#[derive(Clone)]
pub struct RefreshTokenHasher {
    params: Params,
}

impl RefreshTokenHasher {
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, secret: &str) -> Result<String, TokenError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| TokenError::Hashing(e.to_string()))
    }

    /// `Ok(false)` only for a secret that does not match. A stored value
    /// that cannot be verified at all is an error.
    pub fn verify(&self, secret: &str, stored: &str) -> Result<bool, TokenError> {
        let parsed = PasswordHash::new(stored).map_err(|e| TokenError::Hashing(e.to_string()))?;
        match self.argon2().verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(TokenError::Hashing(e.to_string())),
        }
    }

    /// [`Self::hash`] on the blocking pool
    pub async fn hash_blocking(&self, secret: &str) -> Result<String, TokenError> {
        let hasher = self.clone();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| TokenError::Other(anyhow::anyhow!("hash task failed: {}", e)))?
    }

    /// [`Self::verify`] on the blocking pool
    pub async fn verify_blocking(&self, secret: &str, stored: &str) -> Result<bool, TokenError> {
        let hasher = self.clone();
        let secret = secret.to_string();
        let stored = stored.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &stored))
            .await
            .map_err(|e| TokenError::Other(anyhow::anyhow!("verify task failed: {}", e)))?
    }
}

impl Default for RefreshTokenHasher {
    fn default() -> Self {
        Self::with_params(Params::default())
    }
}

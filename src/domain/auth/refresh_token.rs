use super::TokenError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Length of the refresh secret in bytes (256 bits)
pub const SECRET_LEN: usize = 32;

/// Source of unpredictable bytes for refresh tokens.
pub trait EntropySource: Send + Sync {
    fn fill(&self, buf: &mut [u8]) -> Result<(), TokenError>;
}

/// Operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), TokenError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| TokenError::Entropy(e.to_string()))
    }
}

/// A refresh token as handed to the caller.
///
/// The plaintext is `<credential id>.<secret>`. The credential id only locates
/// the stored record and is not secret; the secret is 32 random bytes,
/// base64url encoded, and is the only part that gets hashed.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    id: Uuid,
    secret: String,
}

impl RefreshToken {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn plaintext(&self) -> String {
        format!("{}.{}", self.id.simple(), self.secret)
    }

    /// Split a presented plaintext into its parts. Returns `None` when the
    /// value could not have been produced by [`RefreshTokenGenerator`].
    pub fn parse(presented: &str) -> Option<Self> {
        let (id, secret) = presented.split_once('.')?;
        if id.len() != 32 {
            return None;
        }
        let id = Uuid::parse_str(id).ok()?;

        let decoded = URL_SAFE_NO_PAD.decode(secret).ok()?;
        if decoded.len() != SECRET_LEN {
            return None;
        }

        Some(Self {
            id,
            secret: secret.to_string(),
        })
    }
}

impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Clone)]
pub struct RefreshTokenGenerator {
    entropy: Arc<dyn EntropySource>,
}

impl RefreshTokenGenerator {
    pub fn new(entropy: Arc<dyn EntropySource>) -> Self {
        Self { entropy }
    }

    /// Generate a fresh refresh token
    pub fn generate(&self) -> Result<RefreshToken, TokenError> {
        let mut id_bytes = [0u8; 16];
        self.entropy.fill(&mut id_bytes)?;

        let mut secret = [0u8; SECRET_LEN];
        self.entropy.fill(&mut secret)?;

        Ok(RefreshToken {
            id: uuid::Builder::from_random_bytes(id_bytes).into_uuid(),
            secret: URL_SAFE_NO_PAD.encode(secret),
        })
    }
}

impl Default for RefreshTokenGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsEntropy))
    }
}

pub mod bearer;
pub mod dto;
pub mod error;
pub mod hasher;
pub mod jwt;
pub mod model;
pub mod refresh_token;
pub mod service;
pub mod store;

pub use bearer::parse_bearer;
pub use dto::{IssueRequest, TokenResponse};
pub use error::TokenError;
pub use hasher::RefreshTokenHasher;
pub use jwt::{Claims, JwtManager};
pub use model::CredentialRecord;
pub use refresh_token::{EntropySource, OsEntropy, RefreshToken, RefreshTokenGenerator};
pub use service::AuthService;
pub use store::{TokenStore, ValidatedCredential};

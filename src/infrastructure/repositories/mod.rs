pub mod memory_refresh_token_repository;
pub mod refresh_token_repository;

pub use memory_refresh_token_repository::InMemoryRefreshTokenRepository;
pub use refresh_token_repository::RefreshTokenRepository;

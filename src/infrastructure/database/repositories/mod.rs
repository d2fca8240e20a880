//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod account_repository;
pub mod login_attempt_repository;
pub mod repository_provider;
pub mod token_repository;

pub use account_repository::SeaOrmAccountRepository;
pub use login_attempt_repository::SeaOrmLoginAttemptRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use token_repository::{SeaOrmOneShotTokenRepository, SeaOrmRefreshTokenRepository};

//! Infrastructure layer - external concerns

pub mod crypto;
pub mod database;
pub mod notifications;
pub mod storage;

pub use crypto::{generate_opaque_token, BcryptHasher, JwtConfig, TokenCodec};
pub use database::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};
pub use notifications::{LogNotificationSender, MessageRenderer};
pub use storage::InMemoryRepositoryProvider;

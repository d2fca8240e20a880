//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::{
    AccountRepository, LoginAttemptRepository, OneShotTokenRepository, RefreshTokenRepository,
    RepositoryProvider,
};

use super::account_repository::SeaOrmAccountRepository;
use super::login_attempt_repository::SeaOrmLoginAttemptRepository;
use super::token_repository::{SeaOrmOneShotTokenRepository, SeaOrmRefreshTokenRepository};

/// Unified repository provider backed by SeaORM.
///
/// Holds one connection pool and exposes per-aggregate repository accessors.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let account = repos.accounts().find_by_email("a@x.com").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    accounts: SeaOrmAccountRepository,
    refresh_tokens: SeaOrmRefreshTokenRepository,
    one_shot_tokens: SeaOrmOneShotTokenRepository,
    login_attempts: SeaOrmLoginAttemptRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            accounts: SeaOrmAccountRepository::new(db.clone()),
            refresh_tokens: SeaOrmRefreshTokenRepository::new(db.clone()),
            one_shot_tokens: SeaOrmOneShotTokenRepository::new(db.clone()),
            login_attempts: SeaOrmLoginAttemptRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn accounts(&self) -> &dyn AccountRepository {
        &self.accounts
    }

    fn refresh_tokens(&self) -> &dyn RefreshTokenRepository {
        &self.refresh_tokens
    }

    fn one_shot_tokens(&self) -> &dyn OneShotTokenRepository {
        &self.one_shot_tokens
    }

    fn login_attempts(&self) -> &dyn LoginAttemptRepository {
        &self.login_attempts
    }
}

//! Token repository interfaces

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{OneShotToken, RefreshToken};
use crate::domain::DomainResult;

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Atomically delete the account's current refresh token (if any) and
    /// insert `token` in its place.
    async fn replace_for_account(&self, token: RefreshToken) -> DomainResult<()>;

    async fn find_by_token(&self, token: &str) -> DomainResult<Option<RefreshToken>>;
    async fn find_for_account(&self, account_id: &str) -> DomainResult<Option<RefreshToken>>;

    /// `true` if a row was removed.
    async fn delete_by_token(&self, token: &str) -> DomainResult<bool>;
    async fn delete_for_account(&self, account_id: &str) -> DomainResult<u64>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}

#[async_trait]
pub trait OneShotTokenRepository: Send + Sync {
    async fn insert(&self, token: OneShotToken) -> DomainResult<()>;
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<OneShotToken>>;
    async fn list_for_account(&self, account_id: &str) -> DomainResult<Vec<OneShotToken>>;

    /// Conditional delete: `true` only for the caller that actually removed the
    /// row, so concurrent consumers of the same token see exactly one winner.
    async fn delete_by_token(&self, token: &str) -> DomainResult<bool>;
    async fn delete_for_account(&self, account_id: &str) -> DomainResult<u64>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}

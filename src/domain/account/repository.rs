use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Account, GetAccountsDto, Role, UpdateProfileDto};
use crate::domain::DomainResult;
use crate::shared::PaginatedResult;

/// Persistence for account rows.
///
/// Mutations are column-targeted: each touches only the fields it names
/// (plus `updated_at`, stamped with the caller's `at`), so concurrent updates
/// of different fields on the same account do not overwrite each other.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. Fails `EmailAlreadyExists` on a duplicate email.
    async fn insert(&self, account: Account) -> DomainResult<Account>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Account>>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>>;
    async fn exists_by_email(&self, email: &str) -> DomainResult<bool>;
    async fn count(&self) -> DomainResult<u64>;
    async fn list(&self, dto: GetAccountsDto) -> DomainResult<PaginatedResult<Account>>;

    /// Returns `None` when no account has this id.
    async fn update_profile(
        &self,
        id: &str,
        dto: UpdateProfileDto,
        at: DateTime<Utc>,
    ) -> DomainResult<Option<Account>>;

    // The following return `NotFound` when the id is unknown.
    async fn update_password_hash(
        &self,
        id: &str,
        password_hash: &str,
        at: DateTime<Utc>,
    ) -> DomainResult<()>;
    async fn set_role(&self, id: &str, role: Role, at: DateTime<Utc>) -> DomainResult<()>;
    async fn set_active(&self, id: &str, active: bool, at: DateTime<Utc>) -> DomainResult<()>;
    async fn mark_email_verified(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()>;
    async fn stamp_last_login(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()>;

    /// Returns `NotFound` when nothing was deleted.
    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Delete accounts still unverified that were created before `cutoff`.
    /// Returns the ids removed.
    async fn delete_unverified_before(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<String>>;
}

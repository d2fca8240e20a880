//! Repository traits for the domain layer
//!
//! `RepositoryProvider` is the CredentialStore: one handle that hands out the
//! per-aggregate repositories.

use super::account::AccountRepository;
use super::login_attempt::LoginAttemptRepository;
use super::token::{OneShotTokenRepository, RefreshTokenRepository};

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let account = repos.accounts().find_by_email("a@x.com").await?;
///     let refresh = repos.refresh_tokens().find_for_account(&account.id).await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn accounts(&self) -> &dyn AccountRepository;
    fn refresh_tokens(&self) -> &dyn RefreshTokenRepository;
    fn one_shot_tokens(&self) -> &dyn OneShotTokenRepository;
    fn login_attempts(&self) -> &dyn LoginAttemptRepository;
}

//! Identity module: credential and token lifecycle
//!
//! - `TokenLifecycleManager` issues, validates and expires refresh and
//!   one-shot tokens.
//! - `SessionManager` authenticates and opens / closes sessions.
//! - `AccountService` is the façade the HTTP layer talks to.

pub mod service;
pub mod session;
pub mod token_lifecycle;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use chrono::Duration;

pub use service::{AccountService, MaintenanceReport, RegisterAccount};
pub use session::{AuthenticationResult, SessionManager};
pub use token_lifecycle::{PurgedTokens, TokenLifecycleManager};

use crate::domain::{DomainResult, PasswordHasher};

/// Lifetimes and policy switches for the identity services.
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    pub refresh_token_ttl: Duration,
    pub email_verification_ttl: Duration,
    pub password_reset_ttl: Duration,
    /// Refuse login until the email address is verified.
    pub require_verified_email: bool,
    /// Rows returned by the login history query.
    pub login_history_limit: u64,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            refresh_token_ttl: Duration::days(7),
            email_verification_ttl: Duration::hours(24),
            password_reset_ttl: Duration::minutes(15),
            require_verified_email: false,
            login_history_limit: 50,
        }
    }
}

// bcrypt is deliberately slow; keep it off the async workers.

pub(crate) async fn hash_password(
    hasher: &Arc<dyn PasswordHasher>,
    plain: &str,
) -> DomainResult<String> {
    let hasher = Arc::clone(hasher);
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
}

pub(crate) async fn verify_password(
    hasher: &Arc<dyn PasswordHasher>,
    plain: &str,
    hash: &str,
) -> DomainResult<bool> {
    let hasher = Arc::clone(hasher);
    let plain = plain.to_owned();
    let hash = hash.to_owned();
    Ok(tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash)).await?)
}

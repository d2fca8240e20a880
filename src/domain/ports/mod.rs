//! Domain ports (hexagonal architecture boundaries)
//!
//! Collaborators the identity services depend on but do not implement:
//! password hashing and outbound notifications. Infrastructure provides
//! the adapters.

use async_trait::async_trait;

use super::DomainResult;

// ── PasswordHasher ─────────────────────────────────────────────

/// One-way salted password hashing with constant-time verification.
///
/// Implementations are CPU-bound and blocking; async callers move them onto
/// the blocking pool.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> DomainResult<String>;

    /// `false` for a mismatch and for a hash that cannot be parsed.
    fn verify(&self, plain: &str, hash: &str) -> bool;
}

// ── NotificationSender ─────────────────────────────────────────

/// Delivers account emails. Callers log failures and carry on.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_verification(&self, email: &str, token: &str) -> DomainResult<()>;
    async fn send_password_reset(&self, email: &str, token: &str) -> DomainResult<()>;
}

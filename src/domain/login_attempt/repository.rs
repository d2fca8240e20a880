use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::LoginAttempt;
use crate::domain::DomainResult;

/// Append-only: there is deliberately no update or delete.
#[async_trait]
pub trait LoginAttemptRepository: Send + Sync {
    async fn append(
        &self,
        email: &str,
        successful: bool,
        at: DateTime<Utc>,
    ) -> DomainResult<LoginAttempt>;

    /// Newest first, at most `limit` rows.
    async fn list_for_email(&self, email: &str, limit: u64) -> DomainResult<Vec<LoginAttempt>>;
}

use chrono::{DateTime, Utc};

/// Append-only audit row written for every login call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub id: i64,
    pub email: String,
    pub successful: bool,
    pub timestamp: DateTime<Utc>,
}

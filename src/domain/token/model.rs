//! Persisted opaque tokens: refresh tokens and one-shot (verify / reset) tokens.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::shared::TokenKind;

/// Long-lived opaque credential exchanged for fresh access tokens.
/// At most one per account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub id: String,
    pub token: String,
    pub account_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(
        token: impl Into<String>,
        account_id: impl Into<String>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            token: token.into(),
            account_id: account_id.into(),
            expires_at,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Purpose of a one-shot token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OneShotKind {
    EmailVerification,
    PasswordReset,
}

impl OneShotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailVerification => "EMAIL_VERIFICATION",
            Self::PasswordReset => "PASSWORD_RESET",
        }
    }

    pub fn token_kind(&self) -> TokenKind {
        match self {
            Self::EmailVerification => TokenKind::EmailVerification,
            Self::PasswordReset => TokenKind::PasswordReset,
        }
    }
}

impl fmt::Display for OneShotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OneShotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "EMAIL_VERIFICATION" => Ok(Self::EmailVerification),
            "PASSWORD_RESET" => Ok(Self::PasswordReset),
            other => Err(format!("unknown one-shot token kind: {}", other)),
        }
    }
}

/// Single-use email verification or password reset token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneShotToken {
    pub id: String,
    pub token: String,
    pub kind: OneShotKind,
    pub account_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OneShotToken {
    pub fn new(
        token: impl Into<String>,
        kind: OneShotKind,
        account_id: impl Into<String>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            token: token.into(),
            kind,
            account_id: account_id.into(),
            expires_at,
            created_at: now,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

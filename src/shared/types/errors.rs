use std::fmt;

use thiserror::Error;

/// Which opaque token a [`DomainError::TokenInvalid`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Refresh,
    EmailVerification,
    PasswordReset,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refresh => write!(f, "refresh token"),
            Self::EmailVerification => write!(f, "email verification token"),
            Self::PasswordReset => write!(f, "password reset token"),
        }
    }
}

/// Why a presented opaque token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenFailure {
    #[error("not found")]
    NotFound,
    #[error("expired")]
    Expired,
    #[error("issued for a different purpose")]
    KindMismatch,
}

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum DomainError {
    /// Unknown email or wrong password. Both collapse here.
    #[error("Invalid email or password")]
    BadCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Email address has not been verified")]
    EmailNotVerified,

    #[error("Email already registered: {0}")]
    EmailAlreadyExists(String),

    #[error("Invalid {token}: {reason}")]
    TokenInvalid {
        token: TokenKind,
        reason: TokenFailure,
    },

    /// Wrong current password on a password change.
    #[error("Current password is incorrect")]
    InvalidCredentials,

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation failed: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn token(token: TokenKind, reason: TokenFailure) -> Self {
        Self::TokenInvalid { token, reason }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation::new(field, message)])
    }

    pub fn account_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Account",
            field: "id",
            value: id.into(),
        }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Internal(format!("Database error: {}", e))
    }
}

impl From<tokio::task::JoinError> for DomainError {
    fn from(e: tokio::task::JoinError) -> Self {
        DomainError::Internal(format!("Background task failed: {}", e))
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Failures of the access-token codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed")]
    Malformed,
    #[error("token has expired")]
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_fields() {
        let err = DomainError::Validation(vec![
            FieldViolation::new("email", "invalid email format"),
            FieldViolation::new("password", "too short"),
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: email: invalid email format; password: too short"
        );
    }

    #[test]
    fn token_error_names_kind_and_reason() {
        let err = DomainError::token(TokenKind::PasswordReset, TokenFailure::Expired);
        assert_eq!(err.to_string(), "Invalid password reset token: expired");
    }
}

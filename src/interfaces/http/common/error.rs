//! `DomainError` → HTTP response mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::ApiResponse;
use crate::domain::{DomainError, TokenFailure, TokenKind};

/// Handler error. Wraps a [`DomainError`] and renders it as an
/// [`ApiResponse`] with a stable status code.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::BadCredentials => StatusCode::UNAUTHORIZED,
            DomainError::AccountDisabled | DomainError::EmailNotVerified => StatusCode::FORBIDDEN,
            DomainError::EmailAlreadyExists(_) => StatusCode::CONFLICT,
            DomainError::TokenInvalid { token, reason } => match (token, reason) {
                (TokenKind::EmailVerification, TokenFailure::NotFound) => StatusCode::NOT_FOUND,
                (TokenKind::EmailVerification, TokenFailure::Expired) => StatusCode::GONE,
                (TokenKind::EmailVerification, TokenFailure::KindMismatch) => {
                    StatusCode::BAD_REQUEST
                }
                (TokenKind::Refresh | TokenKind::PasswordReset, _) => StatusCode::FORBIDDEN,
            },
            DomainError::InvalidCredentials => StatusCode::BAD_REQUEST,
            DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::Validation(_) => StatusCode::BAD_REQUEST,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            DomainError::Internal(_) => "Internal server error".to_string(),
            DomainError::Forbidden(_) => "Access denied".to_string(),
            DomainError::EmailAlreadyExists(_) => "Email already registered".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let DomainError::Internal(detail) = &self.0 {
            error!(error = %detail, "Request failed");
        }
        let body = ApiResponse::<()>::error(self.message());
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(e: DomainError) -> StatusCode {
        ApiError(e).status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status(DomainError::BadCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(DomainError::AccountDisabled), StatusCode::FORBIDDEN);
        assert_eq!(
            status(DomainError::EmailAlreadyExists("a@x.com".into())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(DomainError::token(TokenKind::Refresh, TokenFailure::Expired)),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(DomainError::token(
                TokenKind::EmailVerification,
                TokenFailure::NotFound
            )),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(DomainError::token(
                TokenKind::EmailVerification,
                TokenFailure::Expired
            )),
            StatusCode::GONE
        );
        assert_eq!(
            status(DomainError::token(
                TokenKind::PasswordReset,
                TokenFailure::NotFound
            )),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(DomainError::InvalidCredentials), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(DomainError::validation("email", "bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(DomainError::Internal("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ApiError(DomainError::Internal("Database error: disk I/O".into()));
        assert_eq!(err.message(), "Internal server error");
    }
}

//! Bearer authentication middleware for Axum
//!
//! Verifies the access token and stores the resulting [`Actor`] in the
//! request extensions. Handlers behind it extract `Extension<Actor>` and
//! pass it to the service explicitly.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::infrastructure::crypto::TokenCodec;
use crate::interfaces::http::common::ApiResponse;
use crate::shared::CodecError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    ExpiredToken,
}

impl From<CodecError> for AuthError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Expired => AuthError::ExpiredToken,
            CodecError::InvalidSignature | CodecError::Malformed => AuthError::InvalidToken,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Missing authentication token",
            AuthError::InvalidToken => "Invalid authentication token",
            AuthError::ExpiredToken => "Token has expired",
        };
        let body = Json(ApiResponse::<()>::error(message));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// State needed to authenticate a request.
#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<TokenCodec>,
}

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Reject the request with 401 unless it carries a valid access token.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(auth_header) = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return AuthError::MissingToken.into_response();
    };

    let Some(token) = extract_token(auth_header) else {
        return AuthError::InvalidToken.into_response();
    };

    let actor = match auth.codec.parse(token).and_then(|claims| claims.actor()) {
        Ok(actor) => actor,
        Err(e) => {
            debug!(error = %e, "Access token rejected");
            return AuthError::from(e).into_response();
        }
    };

    request.extensions_mut().insert(actor);
    next.run(request).await
}

//! Authentication DTOs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::{AuthenticationResult, RegisterAccount};
use crate::infrastructure::crypto::IssuedToken;
use crate::interfaces::http::modules::users::AccountDto;

const BEARER: &str = "Bearer";

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        email(message = "invalid email format"),
        length(max = 255, message = "email cannot be longer than 255 characters")
    )]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "first name must be 1-50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "last name must be 1-50 characters"))]
    pub last_name: String,
    #[validate(length(max = 20, message = "phone cannot be longer than 20 characters"))]
    pub phone: Option<String>,
}

impl From<RegisterRequest> for RegisterAccount {
    fn from(r: RegisterRequest) -> Self {
        RegisterAccount {
            email: r.email,
            password: r.password,
            first_name: r.first_name,
            last_name: r.last_name,
            phone: r.phone,
        }
    }
}

/// Blank credentials are not rejected here: they reach the service, fail as
/// bad credentials and leave a login attempt behind like any other miss.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(max = 255, message = "email cannot be longer than 255 characters"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub account: AccountDto,
}

impl From<AuthenticationResult> for AuthResponse {
    fn from(auth: AuthenticationResult) -> Self {
        Self {
            expires_in: auth.access_token.expires_in_secs(),
            access_token: auth.access_token.token,
            refresh_token: auth.refresh_token.token,
            token_type: BEARER.to_string(),
            account: auth.account.into(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "refresh token is required"))]
    pub refresh_token: String,
}

/// New access token; the refresh token stays the same.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl From<IssuedToken> for AccessTokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            expires_in: token.expires_in_secs(),
            access_token: token.token,
            token_type: BEARER.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyEmailParams {
    /// Token from the verification email
    pub token: String,
}

/// Body of resend-verification and forgot-password.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmailRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[validate(length(min = 8, max = 128, message = "new password must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "new password must be 8-128 characters"))]
    pub new_password: String,
}

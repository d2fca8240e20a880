//! Authentication API handlers
//!
//! Thin wrappers over [`AccountService`]; every failure is a `DomainError`
//! rendered by [`ApiError`].

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    AccessTokenResponse, AuthResponse, ChangePasswordRequest, EmailRequest, LoginRequest,
    RefreshTokenRequest, RegisterRequest, ResetPasswordRequest, VerifyEmailParams,
};
use crate::application::AccountService;
use crate::domain::Actor;
use crate::interfaces::http::common::{ApiError, ApiResponse, MessageResponse, ValidatedJson};
use crate::interfaces::http::modules::users::AccountDto;

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = ApiResponse<AccountDto>),
        (status = 400, description = "Password policy or field violation"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Malformed request body")
    )
)]
pub async fn register(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), ApiError> {
    let account = service.register(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AccountDto::from(account))),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens", body = ApiResponse<AuthResponse>),
        (status = 401, description = "Invalid email or password"),
        (status = 403, description = "Account disabled")
    )
)]
pub async fn login(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let auth = service.login(&request.email, &request.password).await?;
    ok(auth.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh-token",
    tag = "Authentication",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New access token", body = ApiResponse<AccessTokenResponse>),
        (status = 403, description = "Refresh token unknown or expired")
    )
)]
pub async fn refresh_token(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<AccessTokenResponse> {
    let (access, _) = service.refresh(&request.refresh_token).await?;
    ok(access.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "Authentication",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Refresh token revoked", body = ApiResponse<MessageResponse>)
    )
)]
pub async fn logout(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<MessageResponse> {
    service.logout(&request.refresh_token).await?;
    ok(MessageResponse::new("Logged out"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/verify-email",
    tag = "Authentication",
    params(VerifyEmailParams),
    responses(
        (status = 200, description = "Email verified", body = ApiResponse<AccountDto>),
        (status = 404, description = "Unknown or already used token"),
        (status = 410, description = "Token expired")
    )
)]
pub async fn verify_email(
    State(service): State<Arc<AccountService>>,
    Query(params): Query<VerifyEmailParams>,
) -> ApiResult<AccountDto> {
    let account = service.verify_email(&params.token).await?;
    ok(account.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/resend-verification",
    tag = "Authentication",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Sent if the account exists and is unverified", body = ApiResponse<MessageResponse>)
    )
)]
pub async fn resend_verification(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<EmailRequest>,
) -> ApiResult<MessageResponse> {
    service.resend_verification(&request.email).await?;
    ok(MessageResponse::new(
        "If the account exists and is not verified, a new link has been sent",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "Authentication",
    request_body = EmailRequest,
    responses(
        (status = 200, description = "Always succeeds", body = ApiResponse<MessageResponse>)
    )
)]
pub async fn forgot_password(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<EmailRequest>,
) -> ApiResult<MessageResponse> {
    service.initiate_password_reset(&request.email).await?;
    ok(MessageResponse::new(
        "If the email is registered, a password reset link has been sent",
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Password policy violation"),
        (status = 403, description = "Token unknown, used or expired")
    )
)]
pub async fn reset_password(
    State(service): State<Arc<AccountService>>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> ApiResult<MessageResponse> {
    service
        .reset_password(&request.token, &request.new_password)
        .await?;
    ok(MessageResponse::new("Password has been reset"))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = ApiResponse<AccountDto>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<AccountDto> {
    let account = service.current_account(&actor).await?;
    ok(account.into())
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/change-password",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Current password incorrect or policy violation"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn change_password(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    service
        .change_password(&actor, &request.current_password, &request.new_password)
        .await?;
    ok(MessageResponse::new("Password changed"))
}

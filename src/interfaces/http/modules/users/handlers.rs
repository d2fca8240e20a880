//! Account management API handlers
//!
//! Self-or-admin and admin-only endpoints. The access decision itself is
//! made by the service from the explicit [`Actor`].

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use super::dto::{
    AccountDto, AssignRoleRequest, ListAccountsParams, LoginAttemptDto, UpdateProfileRequest,
};
use crate::application::AccountService;
use crate::domain::{Actor, Role};
use crate::interfaces::http::common::{
    ApiError, ApiResponse, MessageResponse, PaginatedResponse, ValidatedJson,
};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListAccountsParams),
    responses(
        (status = 200, description = "Account page", body = ApiResponse<PaginatedResponse<AccountDto>>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_accounts(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<ListAccountsParams>,
) -> ApiResult<PaginatedResponse<AccountDto>> {
    let page = service.list_accounts(&actor, params.into_query()?).await?;
    Ok(Json(ApiResponse::success(page.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account details", body = ApiResponse<AccountDto>),
        (status = 403, description = "Neither owner nor admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_account(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<AccountDto> {
    let account = service.get_account(&actor, &id).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<AccountDto>),
        (status = 403, description = "Neither owner nor admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_profile(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<AccountDto> {
    let account = service.update_profile(&actor, &id, request.into()).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deleted", body = ApiResponse<MessageResponse>),
        (status = 403, description = "Neither owner nor admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_account(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<MessageResponse> {
    service.delete_account(&actor, &id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Account deleted",
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/role",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = ApiResponse<AccountDto>),
        (status = 400, description = "Unknown role"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn assign_role(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<AssignRoleRequest>,
) -> ApiResult<AccountDto> {
    let role: Role = request.role.parse()?;
    let account = service.assign_role(&actor, &id, role).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/deactivate",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deactivated, sessions closed", body = ApiResponse<AccountDto>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn deactivate(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<AccountDto> {
    let account = service.deactivate(&actor, &id).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/reactivate",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account reactivated", body = ApiResponse<AccountDto>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn reactivate(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<AccountDto> {
    let account = service.reactivate(&actor, &id).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/login-attempts",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Login attempts, newest first", body = ApiResponse<Vec<LoginAttemptDto>>),
        (status = 403, description = "Neither owner nor admin")
    )
)]
pub async fn login_history(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> ApiResult<Vec<LoginAttemptDto>> {
    let attempts = service.login_history(&actor, &id).await?;
    Ok(Json(ApiResponse::success(
        attempts.into_iter().map(LoginAttemptDto::from).collect(),
    )))
}

//! Maintenance handlers. Invoked on demand; nothing here is scheduled.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use chrono::Duration;

use super::dto::{MaintenanceReportDto, PurgeUnverifiedRequest};
use crate::application::AccountService;
use crate::domain::Actor;
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};

#[utoipa::path(
    post,
    path = "/api/v1/admin/maintenance/purge-unverified",
    tag = "Maintenance",
    security(("bearer_auth" = [])),
    request_body = PurgeUnverifiedRequest,
    responses(
        (status = 200, description = "Stale unverified accounts removed", body = ApiResponse<MaintenanceReportDto>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn purge_unverified(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
    ValidatedJson(request): ValidatedJson<PurgeUnverifiedRequest>,
) -> Result<Json<ApiResponse<MaintenanceReportDto>>, ApiError> {
    let report = service
        .purge_unverified(&actor, Duration::hours(request.older_than_hours))
        .await?;
    Ok(Json(ApiResponse::success(report.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/maintenance/purge-tokens",
    tag = "Maintenance",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Expired tokens removed", body = ApiResponse<MaintenanceReportDto>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn purge_tokens(
    State(service): State<Arc<AccountService>>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<ApiResponse<MaintenanceReportDto>>, ApiError> {
    let report = service.purge_expired_tokens(&actor).await?;
    Ok(Json(ApiResponse::success(report.into())))
}

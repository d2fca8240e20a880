//! Maintenance DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::MaintenanceReport;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PurgeUnverifiedRequest {
    /// Remove unverified accounts created more than this many hours ago
    #[validate(range(min = 0, max = 87600, message = "must be between 0 and 87600 hours"))]
    pub older_than_hours: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MaintenanceReportDto {
    pub accounts_removed: u64,
    pub refresh_tokens_removed: u64,
    pub one_shot_tokens_removed: u64,
}

impl From<MaintenanceReport> for MaintenanceReportDto {
    fn from(r: MaintenanceReport) -> Self {
        Self {
            accounts_removed: r.accounts_removed,
            refresh_tokens_removed: r.tokens.refresh_tokens,
            one_shot_tokens_removed: r.tokens.one_shot_tokens,
        }
    }
}

//! Account DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{Account, DomainResult, GetAccountsDto, LoginAttempt, Role, UpdateProfileDto};

/// Account API representation. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountDto {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// USER, ORGANIZER or ADMIN
    pub role: String,
    pub role_display_name: String,
    pub can_create_events: bool,
    pub can_manage_users: bool,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        Self {
            full_name: a.full_name(),
            role: a.role.as_str().to_string(),
            role_display_name: a.role.display_name().to_string(),
            can_create_events: a.role.can_create_events(),
            can_manage_users: a.role.can_manage_users(),
            id: a.id,
            email: a.email,
            first_name: a.first_name,
            last_name: a.last_name,
            phone: a.phone,
            is_active: a.is_active,
            is_email_verified: a.is_email_verified,
            created_at: a.created_at,
            updated_at: a.updated_at,
            last_login_at: a.last_login_at,
        }
    }
}

/// List accounts query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListAccountsParams {
    /// Substring of first name, last name or email
    pub search: Option<String>,
    /// USER, ORGANIZER or ADMIN
    pub role: Option<String>,
    pub is_active: Option<bool>,
    /// 1-based, default 1
    pub page: Option<u32>,
    /// 1-100, default 20
    pub page_size: Option<u32>,
}

impl ListAccountsParams {
    pub fn into_query(self) -> DomainResult<GetAccountsDto> {
        let role = self.role.as_deref().map(str::parse::<Role>).transpose()?;
        Ok(GetAccountsDto {
            search: self.search.filter(|s| !s.trim().is_empty()),
            role,
            is_active: self.is_active,
            page: self.page,
            page_size: self.page_size,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "first name must be 1-50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "last name must be 1-50 characters"))]
    pub last_name: Option<String>,
    #[validate(length(max = 20, message = "phone cannot be longer than 20 characters"))]
    pub phone: Option<String>,
}

impl From<UpdateProfileRequest> for UpdateProfileDto {
    fn from(r: UpdateProfileRequest) -> Self {
        UpdateProfileDto {
            first_name: r.first_name,
            last_name: r.last_name,
            phone: r.phone,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignRoleRequest {
    /// USER, ORGANIZER or ADMIN
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginAttemptDto {
    pub id: i64,
    pub email: String,
    pub successful: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<LoginAttempt> for LoginAttemptDto {
    fn from(a: LoginAttempt) -> Self {
        Self {
            id: a.id,
            email: a.email,
            successful: a.successful,
            timestamp: a.timestamp,
        }
    }
}

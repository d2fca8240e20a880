//! Account domain entity

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::CreateAccountDto;
use crate::domain::authorization::Actor;
use crate::domain::{DomainError, DomainResult};

/// Closed set of account roles. Privileges are a pure mapping from the variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    User,
    Organizer,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::User, Role::Organizer, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Organizer => "ORGANIZER",
            Self::Admin => "ADMIN",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::User => "Regular User",
            Self::Organizer => "Event Organizer",
            Self::Admin => "System Administrator",
        }
    }

    pub fn has_admin_privileges(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn can_create_events(&self) -> bool {
        matches!(self, Self::Organizer | Self::Admin)
    }

    pub fn can_manage_users(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                DomainError::validation("role", "must be one of USER, ORGANIZER, ADMIN")
            })
    }
}

/// User account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    /// Unique, compared case-sensitively.
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Build a new account row from a creation request. Assigns a fresh id.
    pub fn new(dto: CreateAccountDto, now: DateTime<Utc>) -> DomainResult<Self> {
        if dto.email.trim().is_empty() {
            return Err(DomainError::validation("email", "cannot be blank"));
        }
        if dto.password_hash.is_empty() {
            return Err(DomainError::Internal(
                "account created without a password hash".into(),
            ));
        }

        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: dto.email,
            password_hash: dto.password_hash,
            first_name: dto.first_name,
            last_name: dto.last_name,
            phone: dto.phone,
            role: dto.role,
            is_active: dto.is_active,
            is_email_verified: dto.is_email_verified,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        })
    }

    /// Active and verified: the strict notion of a fully usable account.
    pub fn is_enabled(&self) -> bool {
        self.is_active && self.is_email_verified
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.id.clone(), self.role)
    }
}

// ── Tests ──────────────────────────────────────────────────────

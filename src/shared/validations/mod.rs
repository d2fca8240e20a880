//! Input rules shared by the HTTP DTOs and the application services.

use super::types::{DomainError, DomainResult, FieldViolation};

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const NAME_MAX_LEN: usize = 50;
pub const PHONE_MAX_LEN: usize = 20;
pub const EMAIL_MAX_LEN: usize = 255;

const PASSWORD_SPECIALS: &str = "@#$%^&+=!";

pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be at least 8 characters and contain at least one digit, one uppercase letter, one lowercase letter, and one special character (@#$%^&+=!)";

/// Clamp page / page size to sane bounds.
pub fn validate_pagination(page: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(20).clamp(1, 100);
    (page, limit)
}

pub fn is_strong_password(password: &str) -> bool {
    let len = password.chars().count();
    (PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| PASSWORD_SPECIALS.contains(c))
}

pub fn check_password(field: &str, password: &str) -> DomainResult<()> {
    if is_strong_password(password) {
        Ok(())
    } else {
        Err(DomainError::validation(field, PASSWORD_POLICY_MESSAGE))
    }
}

/// Collects field violations and turns them into one `DomainError::Validation`.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.push(FieldViolation::new(field, message));
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) -> &mut Self {
        let ok = value.chars().count() <= max;
        self.check(ok, field, &format!("cannot be longer than {} characters", max))
    }

    pub fn not_blank(&mut self, field: &str, value: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "is mandatory")
    }

    pub fn into_result(self) -> DomainResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.0))
        }
    }
}

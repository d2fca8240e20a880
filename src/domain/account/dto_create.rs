use super::Role;

/// Everything needed to insert a new account. Password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateAccountDto {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub is_email_verified: bool,
}

impl CreateAccountDto {
    /// Self-registration defaults: USER role, active, unverified.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        phone: Option<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            phone,
            role: Role::User,
            is_active: true,
            is_email_verified: false,
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn verified(mut self) -> Self {
        self.is_email_verified = true;
        self
    }
}

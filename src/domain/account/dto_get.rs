use super::Role;

#[derive(Debug, Clone, Default)]
pub struct GetAccountsDto {
    /// Substring match on first name, last name or email
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

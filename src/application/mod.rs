pub mod identity;

pub use identity::{
    AccountService, AuthenticationResult, IdentitySettings, MaintenanceReport, PurgedTokens,
    RegisterAccount, SessionManager, TokenLifecycleManager,
};

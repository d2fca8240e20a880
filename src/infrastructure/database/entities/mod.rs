//! Database entities module

pub mod account;
pub mod login_attempt;
pub mod one_shot_token;
pub mod refresh_token;

pub use account::Entity as Account;
pub use login_attempt::Entity as LoginAttempt;
pub use one_shot_token::Entity as OneShotToken;
pub use refresh_token::Entity as RefreshToken;

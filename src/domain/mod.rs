//! Domain layer
//!
//! Aggregates (account, tokens, login attempts), repository traits,
//! collaborator ports and the authorization gate. No I/O lives here.

pub mod account;
pub mod authorization;
pub mod login_attempt;
pub mod ports;
pub mod repositories;
pub mod token;

pub use account::{
    Account, AccountRepository, CreateAccountDto, GetAccountsDto, Role, UpdateProfileDto,
};
pub use authorization::{Actor, AuthorizationGate};
pub use login_attempt::{LoginAttempt, LoginAttemptRepository};
pub use ports::{NotificationSender, PasswordHasher};
pub use repositories::RepositoryProvider;
pub use token::{
    OneShotKind, OneShotToken, OneShotTokenRepository, RefreshToken, RefreshTokenRepository,
};

pub use crate::shared::{DomainError, DomainResult, FieldViolation, TokenFailure, TokenKind};

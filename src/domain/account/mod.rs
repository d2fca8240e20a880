//! Account aggregate
//!
//! Contains the Account entity, role model, DTOs, and repository interface.

pub mod model;
pub mod repository;

mod dto_create;
mod dto_get;
mod dto_update;

pub use model::{Account, Role};

pub use dto_create::CreateAccountDto;
pub use dto_get::GetAccountsDto;
pub use dto_update::UpdateProfileDto;

pub use repository::AccountRepository;

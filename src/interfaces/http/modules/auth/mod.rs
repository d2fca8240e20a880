//! Authentication module: registration, login, tokens, password flows

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;

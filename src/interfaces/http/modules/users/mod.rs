//! Users module: profiles, roles, activation, login history

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;

//! Token aggregate
//!
//! Refresh tokens and one-shot tokens, plus their repository interfaces.

pub mod model;
pub mod repository;

pub use model::{OneShotKind, OneShotToken, RefreshToken};
pub use repository::{OneShotTokenRepository, RefreshTokenRepository};

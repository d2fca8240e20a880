//! Login attempt audit trail

pub mod model;
pub mod repository;

pub use model::LoginAttempt;
pub use repository::LoginAttemptRepository;

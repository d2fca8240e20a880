//! # Account Service
//!
//! User accounts, authentication and token lifecycle behind a REST API.
//!
//! ## Architecture
//!
//! - **domain**: accounts, roles, tokens, login attempts, repository traits,
//!   collaborator ports and the authorization gate
//! - **application**: token lifecycle, sessions and the account service façade
//! - **infrastructure**: JWT codec, bcrypt, SeaORM store, in-memory store,
//!   notification sender
//! - **interfaces**: axum router, bearer middleware, Swagger docs
//! - **shared**: error taxonomy, clock, pagination, validation, shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{
    init_database, DatabaseConfig, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};

pub use interfaces::http::{create_api_router, AppState};

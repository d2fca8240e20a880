//! HTTP REST API
//!
//! - `middleware`: bearer authentication producing an [`Actor`](crate::domain::Actor)
//! - `modules`: DTOs and handlers per resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, AppState};

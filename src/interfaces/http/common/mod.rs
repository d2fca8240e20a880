//! Shared HTTP building blocks: response envelope, error mapping, extractors.

pub mod error;
pub mod response;
pub mod validated_json;

pub use error::ApiError;
pub use response::{ApiResponse, MessageResponse, PaginatedResponse};
pub use validated_json::ValidatedJson;

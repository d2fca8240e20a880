//! Cryptographic adapters: access-token codec, password hashing, opaque tokens.

pub mod jwt;
pub mod password;
pub mod token;

pub use jwt::{AccessClaims, IssuedToken, JwtConfig, TokenCodec};
pub use password::BcryptHasher;
pub use token::generate_opaque_token;

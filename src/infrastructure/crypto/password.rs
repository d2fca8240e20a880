//! Password hashing utilities

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::domain::{DomainError, DomainResult, PasswordHasher};

/// bcrypt's accepted cost range.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// bcrypt-backed [`PasswordHasher`]. The cost factor is configurable so tests
/// can run with the minimum.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plain: &str) -> DomainResult<String> {
        hash(plain, self.cost)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, plain: &str, hash: &str) -> bool {
        verify(plain, hash).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = BcryptHasher::new(MIN_COST);
        let hashed = hasher.hash("Abc12345!").unwrap();

        assert_ne!(hashed, "Abc12345!");
        assert!(hasher.verify("Abc12345!", &hashed));
        assert!(!hasher.verify("abc12345!", &hashed));
    }

    #[test]
    fn unparseable_hash_never_verifies() {
        let hasher = BcryptHasher::new(MIN_COST);
        assert!(!hasher.verify("Abc12345!", "not-a-bcrypt-hash"));
    }

    #[test]
    fn cost_is_clamped() {
        assert_eq!(BcryptHasher::new(1).cost(), MIN_COST);
    }
}

//! Role-based access decisions.
//!
//! Every protected operation receives an explicit [`Actor`], derived once from
//! the access token at the boundary, and asks [`AuthorizationGate`] whether it
//! may proceed.

use serde::{Deserialize, Serialize};

use super::account::Role;
use super::{DomainError, DomainResult};

/// The authenticated identity performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.has_admin_privileges()
    }
}

/// Stateless decision function.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    /// ADMIN always passes. Otherwise a required role must match exactly,
    /// and without one the actor must own the resource. With neither an
    /// owner nor a required role, only ADMIN passes.
    pub fn can_access(actor: &Actor, owner_id: Option<&str>, required: Option<Role>) -> bool {
        if actor.is_admin() {
            return true;
        }
        match (required, owner_id) {
            (Some(role), _) => actor.role == role,
            (None, Some(owner)) => actor.user_id == owner,
            (None, None) => false,
        }
    }

    pub fn ensure(
        actor: &Actor,
        owner_id: Option<&str>,
        required: Option<Role>,
    ) -> DomainResult<()> {
        if Self::can_access(actor, owner_id, required) {
            Ok(())
        } else {
            Self::deny(actor)
        }
    }

    pub fn ensure_self_or_admin(actor: &Actor, owner_id: &str) -> DomainResult<()> {
        Self::ensure(actor, Some(owner_id), None)
    }

    /// Listing accounts, assigning roles and (de)activating need the
    /// user-management capability.
    pub fn ensure_admin(actor: &Actor) -> DomainResult<()> {
        if actor.role.can_manage_users() {
            Ok(())
        } else {
            Self::deny(actor)
        }
    }

    fn deny(actor: &Actor) -> DomainResult<()> {
        tracing::debug!(actor = %actor.user_id, role = %actor.role, "access denied");
        Err(DomainError::Forbidden("Access denied".into()))
    }
}

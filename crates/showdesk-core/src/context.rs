//! Tenant context and identity resolution.
//!
//! A [`TenantContext`] can only be obtained from a [`TenantResolver`],
//! which in turn only accepts a [`VerifiedIdentity`] produced by the token
//! validator. Client-supplied tenant ids never reach a repository.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ShowdeskError, ShowdeskResult};
use crate::models::capability::{Capability, Role};

/// Claims extracted from an already-validated access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub role: Role,
}

/// The authenticated user acting inside a tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

/// Mandatory parameter of every tenant-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: Uuid,
    actor: Actor,
}

impl TenantContext {
    /// Build a context for a tenant whose subscription has already been
    /// checked. Resolvers are the intended callers.
    pub fn new(tenant_id: Uuid, actor: Actor) -> Self {
        Self { tenant_id, actor }
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn user_id(&self) -> Uuid {
        self.actor.user_id
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.actor.role.allows(capability)
    }

    /// Fail with `PermissionDenied` unless the actor holds `capability`.
    pub fn require(&self, capability: Capability) -> ShowdeskResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(ShowdeskError::PermissionDenied {
                capability: capability.to_string(),
            })
        }
    }
}

/// Turns a verified identity into a tenant context, rejecting unknown,
/// suspended or expired tenants.
pub trait TenantResolver: Send + Sync {
    fn resolve(
        &self,
        identity: &VerifiedIdentity,
    ) -> impl Future<Output = ShowdeskResult<TenantContext>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_missing_capability() {
        let ctx = TenantContext::new(
            Uuid::new_v4(),
            Actor {
                user_id: Uuid::new_v4(),
                role: Role::member([Capability::ViewDre]),
            },
        );
        assert!(ctx.require(Capability::ViewDre).is_ok());
        match ctx.require(Capability::ApproveContracts) {
            Err(ShowdeskError::PermissionDenied { capability }) => {
                assert_eq!(capability, "approve_contracts")
            }
            other => panic!("expected PermissionDenied, got {other:?}"),
        }
    }
}

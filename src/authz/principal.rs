use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::Role;
use crate::errors::{AppError, AppResult};

/// Identity asserted by a verified session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub organization_id: Option<Uuid>,
}

impl Principal {
    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn require_any(&self, roles: &[Role]) -> AppResult<()> {
        if self.has_any_role(roles) {
            return Ok(());
        }

        tracing::debug!(
            user_id = %self.user_id,
            role = %self.role,
            "role not permitted for operation"
        );
        Err(AppError::forbidden(format!("role {} may not perform this action", self.role)))
    }

    /// Every account other than the top-level operator must belong to an organization.
    pub fn has_valid_scope(&self) -> bool {
        self.is_super_admin() || self.organization_id.is_some()
    }

    fn own_organization(&self) -> AppResult<Uuid> {
        self.organization_id
            .ok_or_else(|| AppError::forbidden("account is not attached to an organization"))
    }

    /// Organization a read should be limited to. `None` means unrestricted,
    /// which only the super admin can get.
    pub fn scope(&self, requested: Option<Uuid>) -> AppResult<Option<Uuid>> {
        if self.is_super_admin() {
            return Ok(requested);
        }

        let own = self.own_organization()?;
        match requested {
            Some(other) if other != own => Err(AppError::forbidden("organization is outside your scope")),
            _ => Ok(Some(own)),
        }
    }

    /// Organization a new record is written into.
    pub fn owning_organization(&self, requested: Option<Uuid>) -> AppResult<Uuid> {
        match self.scope(requested)? {
            Some(organization_id) => Ok(organization_id),
            None => Err(AppError::bad_request("organization_id is required")),
        }
    }

    pub fn can_reach(&self, organization_id: Uuid) -> bool {
        self.is_super_admin() || self.organization_id == Some(organization_id)
    }
}

use uuid::Uuid;
use crate::types::{UserRole, Permission, ReportingScope};
use crate::errors::ServiceError;

/// Represents the authenticated caller of the current operation.
///
/// Built by the authentication middleware; the core trusts it as given.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The ID of the authenticated employee
    pub user_id: Uuid,

    /// The role of the authenticated employee
    pub role: UserRole,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    /// Check if user has a specific permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    /// Authorize a specific permission, returning an error if not allowed
    pub fn authorize(&self, permission: Permission) -> Result<(), ServiceError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(format!(
                "User does not have permission: {:?}",
                permission
            )))
        }
    }

    pub fn reporting_scope(&self) -> ReportingScope {
        self.role.reporting_scope(self.user_id)
    }

    /// For operations restricted to the caller's own records
    pub fn authorize_self(&self, resource_owner_id: &Uuid) -> Result<(), ServiceError> {
        if &self.user_id == resource_owner_id {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "You can only act on your own records".to_string()
            ))
        }
    }

    /// Manager-side actions require the target to report directly to the caller
    pub fn authorize_direct_manager_of(&self, target_manager_id: Option<Uuid>) -> Result<(), ServiceError> {
        if target_manager_id == Some(self.user_id) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied(
                "Employee is not one of your direct reports".to_string()
            ))
        }
    }

    /// Like `authorize_direct_manager_of`, but organisation-wide roles pass
    pub fn authorize_manager_or_org(&self, target_manager_id: Option<Uuid>) -> Result<(), ServiceError> {
        match self.reporting_scope() {
            ReportingScope::Organization => Ok(()),
            _ => self.authorize_direct_manager_of(target_manager_id),
        }
    }
}

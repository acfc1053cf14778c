//! Role and permission checks. Super-admins skip both.

use std::collections::BTreeSet;

use scolaguard_core::AuthzError;
use scolaguard_models::Principal;

/// `required_roles` is any-of; `required_permissions` is all-of.
pub fn check(
    principal: &Principal,
    granted: &BTreeSet<String>,
    required_roles: &[String],
    required_permissions: &BTreeSet<String>,
) -> Result<(), AuthzError> {
    if principal.is_super_admin {
        return Ok(());
    }

    if !required_roles.is_empty() && !principal.has_any_role(required_roles) {
        return Err(AuthzError::InsufficientPermission {
            missing_permissions: Vec::new(),
            required_roles: required_roles.to_vec(),
        });
    }

    let missing: Vec<String> = required_permissions.difference(granted).cloned().collect();
    if !missing.is_empty() {
        return Err(AuthzError::InsufficientPermission {
            missing_permissions: missing,
            required_roles: Vec::new(),
        });
    }

    Ok(())
}

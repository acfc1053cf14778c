//! The authenticated caller.

use serde::Serialize;

use crate::ids::{TenantId, UserId};

/// Rehydrated from a verified token on every request.
///
/// Permissions are not carried here: they are resolved per request through
/// the role catalogue so a role change takes effect without reissuing tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: UserId,
    /// `None` for platform-level accounts that are not bound to one tenant.
    pub tenant_id: Option<TenantId>,
    pub roles: Vec<String>,
    pub is_super_admin: bool,
}

impl Principal {
    pub fn new(user_id: UserId, tenant_id: Option<TenantId>, roles: Vec<String>) -> Self {
        Self {
            user_id,
            tenant_id,
            roles,
            is_super_admin: false,
        }
    }

    pub fn super_admin(user_id: UserId) -> Self {
        Self {
            user_id,
            tenant_id: None,
            roles: vec!["super_admin".to_string()],
            is_super_admin: true,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn has_any_role<S: AsRef<str>>(&self, roles: &[S]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_ref()))
    }

    /// The first assigned role, used as the display role in audit records.
    pub fn primary_role(&self) -> Option<&str> {
        self.roles.first().map(String::as_str)
    }
}

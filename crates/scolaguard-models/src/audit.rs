//! Audit trail records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::ids::{TenantId, UserId};

/// One immutable audit line. Never updated or deleted once appended.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditRecord {
    /// [`TenantId::SYSTEM`] when the action had no resolved tenant.
    pub tenant_id: TenantId,
    pub user_id: Option<UserId>,
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
    /// Sanitized snapshot of the submitted fields.
    pub changes: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            tenant_id: TenantId::SYSTEM,
            user_id: None,
            action: action.into(),
            resource: resource.into(),
            resource_id: None,
            changes: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.action.ends_with("_FAILED")
    }
}

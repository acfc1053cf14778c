//! The resolved scope of a single request.

use scolaguard_core::AuthzError;
use serde::Serialize;
use utoipa::ToSchema;

use crate::ids::{AcademicYearId, SchoolLevelId, TenantId};
use crate::modules::ModuleType;

/// Tenant, school level, module and academic year governing one request.
///
/// Fields are private: once built, a context cannot be edited, only compared
/// with another one through [`RequestContext::reconcile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct RequestContext {
    tenant_id: TenantId,
    school_level_id: SchoolLevelId,
    module_type: Option<ModuleType>,
    academic_year_id: Option<AcademicYearId>,
}

impl RequestContext {
    pub fn new(tenant_id: TenantId, school_level_id: SchoolLevelId) -> Self {
        Self {
            tenant_id,
            school_level_id,
            module_type: None,
            academic_year_id: None,
        }
    }

    pub fn with_module(mut self, module_type: ModuleType) -> Self {
        self.module_type = Some(module_type);
        self
    }

    pub fn with_academic_year(mut self, academic_year_id: AcademicYearId) -> Self {
        self.academic_year_id = Some(academic_year_id);
        self
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn school_level_id(&self) -> SchoolLevelId {
        self.school_level_id
    }

    pub fn module_type(&self) -> Option<ModuleType> {
        self.module_type
    }

    pub fn academic_year_id(&self) -> Option<AcademicYearId> {
        self.academic_year_id
    }

    /// Accept `other` only if it describes the same scope.
    ///
    /// A field unset on either side is not a conflict; a field set to two
    /// different values is.
    pub fn reconcile(&self, other: &RequestContext) -> Result<(), AuthzError> {
        if self.tenant_id != other.tenant_id {
            return Err(conflict("tenantId"));
        }
        if self.school_level_id != other.school_level_id {
            return Err(conflict("schoolLevelId"));
        }
        if differs(self.module_type, other.module_type) {
            return Err(conflict("moduleType"));
        }
        if differs(self.academic_year_id, other.academic_year_id) {
            return Err(conflict("academicYearId"));
        }
        Ok(())
    }
}

fn differs<T: PartialEq>(a: Option<T>, b: Option<T>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a != b)
}

fn conflict(field: &str) -> AuthzError {
    AuthzError::ScopeMismatch(format!(
        "{field} conflicts with the context already resolved for this request"
    ))
}

//! Cache key layout.
//!
//! Every key starts with `scolaguard:` and is scoped by tenant then school
//! level, so one pattern clears everything cached for a scope.

use scolaguard_models::{
    ModuleType,
    ids::{SchoolLevelId, TenantId},
};

const CACHE_PREFIX: &str = "scolaguard";

fn build_key(parts: &[&str]) -> String {
    format!("{}:{}", CACHE_PREFIX, parts.join(":"))
}

/// Cache keys for module rows.
pub mod modules {
    use super::*;

    /// Key for one module row.
    pub fn by_type(tenant: TenantId, level: SchoolLevelId, module: ModuleType) -> String {
        build_key(&[
            "tenant",
            &tenant.to_string(),
            "level",
            &level.to_string(),
            "module",
            module.as_str(),
        ])
    }

    /// Key for the module list of a scope.
    pub fn list(tenant: TenantId, level: SchoolLevelId) -> String {
        build_key(&[
            "tenant",
            &tenant.to_string(),
            "level",
            &level.to_string(),
            "modules",
        ])
    }

    /// Pattern matching every module key of a scope.
    pub fn scope_pattern(tenant: TenantId, level: SchoolLevelId) -> String {
        format!("{}:tenant:{}:level:{}:*", CACHE_PREFIX, tenant, level)
    }
}

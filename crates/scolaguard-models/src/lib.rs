//! # Scolaguard Models
//!
//! Domain models and DTOs shared by the engine, the registry and the CLI.
//!
//! # Modules
//!
//! - [`ids`]: strongly-typed UUID newtypes (tenant, school level, ...)
//! - [`modules`]: module types, statuses, persisted module rows and admin DTOs
//! - [`access`]: access levels used by the module access matrix
//! - [`context`]: the resolved per-request scope
//! - [`principal`]: the authenticated caller
//! - [`audit`]: audit trail records
//!
//! # Example
//!
//! ```ignore
//! use scolaguard_models::{ModuleType, RequestContext, ids::{TenantId, SchoolLevelId}};
//!
//! let ctx = RequestContext::new(TenantId::new(), SchoolLevelId::new())
//!     .with_module(ModuleType::Finances);
//! assert_eq!(ctx.module_type(), Some(ModuleType::Finances));
//! ```

pub mod access;
pub mod audit;
pub mod context;
pub mod ids;
pub mod modules;
pub mod principal;

pub use access::AccessLevel;
pub use audit::AuditRecord;
pub use context::RequestContext;
pub use modules::{
    AccessMatrixEntry, ContextResponse, DependencyStatus, Module, ModuleStatus, ModuleType,
    NewModule, ParseModuleError, UpdateModuleStatusDto,
};
pub use principal::Principal;

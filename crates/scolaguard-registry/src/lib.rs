//! # Scolaguard Registry
//!
//! Which modules are enabled for a tenant and school level, what they depend
//! on, and which module may touch which.
//!
//! - [`store`]: the [`ModuleStore`] persistence seam with in-memory, Postgres
//!   and Redis-cached implementations
//! - [`catalog`]: the default module set seeded for a new school level
//! - [`registry`]: [`ModuleRegistry`], enablement and dependency checks
//! - [`matrix`]: the static module-to-module [`AccessMatrix`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use scolaguard_registry::{ModuleRegistry, store::memory::MemoryModuleStore};
//!
//! let registry = ModuleRegistry::new(Arc::new(MemoryModuleStore::new()), RegistryConfig::default());
//! registry.initialize_defaults(tenant, level).await?;
//! assert!(registry.is_enabled(tenant, ModuleType::Scolarite, level).await?);
//! ```

pub mod catalog;
pub mod matrix;
pub mod registry;
pub mod store;

pub use matrix::AccessMatrix;
pub use registry::{DependencyCheck, ModuleRegistry, RegistryError};
pub use store::{ModuleStore, StoreError, StoreResult};

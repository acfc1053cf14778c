//! Persistence seam for module rows.
//!
//! The registry only talks to a [`ModuleStore`]; which backend sits behind it
//! is decided once at startup.

use async_trait::async_trait;
use thiserror::Error;

use scolaguard_core::AppError;
use scolaguard_models::{
    Module, ModuleType, NewModule,
    ids::{SchoolLevelId, TenantId},
};

pub mod cached;
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::NotFound(_) => AppError::not_found(self),
            Self::Conflict(_) => AppError::conflict(self),
            Self::Unexpected(err) => AppError::internal(err),
        }
    }
}

#[async_trait]
pub trait ModuleStore: Send + Sync {
    /// The row only if it is enabled and active.
    async fn find_enabled(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>>;

    async fn find_by_type(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>>;

    /// All rows of a scope, ordered by module type.
    async fn list(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Vec<Module>>;

    /// Fails with [`StoreError::Conflict`] when the (tenant, type, level) row exists.
    async fn create(&self, module: NewModule) -> StoreResult<Module>;

    /// Overwrites the mutable fields of an existing row. Last write wins.
    async fn update(&self, module: &Module) -> StoreResult<Module>;

    fn backend_name(&self) -> &'static str;
}

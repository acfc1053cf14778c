//! Read-through Redis cache in front of another module store.
//!
//! Rows and scope lists are cached with the configured TTL. Every write
//! clears the whole scope, so a toggle is visible on the next request.

use async_trait::async_trait;
use tracing::{debug, warn};

use scolaguard_cache::{RedisCache, keys};
use scolaguard_models::{
    Module, ModuleType, NewModule,
    ids::{SchoolLevelId, TenantId},
};

use super::{ModuleStore, StoreResult};

#[derive(Debug, Clone)]
pub struct CachedModuleStore<S> {
    inner: S,
    cache: RedisCache,
}

impl<S: ModuleStore> CachedModuleStore<S> {
    pub fn new(inner: S, cache: RedisCache) -> Self {
        Self { inner, cache }
    }

    async fn invalidate_scope(&self, tenant_id: TenantId, school_level_id: SchoolLevelId) {
        let pattern = keys::modules::scope_pattern(tenant_id, school_level_id);
        if let Err(e) = self.cache.invalidate_pattern(&pattern).await {
            warn!(error = %e, tenant_id = %tenant_id, school_level_id = %school_level_id, "Failed to invalidate module cache");
        }
    }
}

#[async_trait]
impl<S: ModuleStore> ModuleStore for CachedModuleStore<S> {
    async fn find_enabled(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>> {
        let row = self
            .find_by_type(tenant_id, module_type, school_level_id)
            .await?;
        Ok(row.filter(Module::is_operational))
    }

    async fn find_by_type(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>> {
        let key = keys::modules::by_type(tenant_id, school_level_id, module_type);
        if let Some(module) = self.cache.get::<Module>(&key).await {
            return Ok(Some(module));
        }

        let row = self
            .inner
            .find_by_type(tenant_id, module_type, school_level_id)
            .await?;
        // Misses are not cached: a module created by another instance must show up.
        if let Some(module) = &row {
            if let Err(e) = self.cache.set(&key, module).await {
                debug!(error = %e, "Failed to cache module row");
            }
        }
        Ok(row)
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Vec<Module>> {
        let key = keys::modules::list(tenant_id, school_level_id);
        if let Some(modules) = self.cache.get::<Vec<Module>>(&key).await {
            return Ok(modules);
        }

        let modules = self.inner.list(tenant_id, school_level_id).await?;
        if !modules.is_empty() {
            if let Err(e) = self.cache.set(&key, &modules).await {
                debug!(error = %e, "Failed to cache module list");
            }
        }
        Ok(modules)
    }

    async fn create(&self, module: NewModule) -> StoreResult<Module> {
        let (tenant_id, school_level_id) = (module.tenant_id, module.school_level_id);
        let created = self.inner.create(module).await?;
        self.invalidate_scope(tenant_id, school_level_id).await;
        Ok(created)
    }

    async fn update(&self, module: &Module) -> StoreResult<Module> {
        let updated = self.inner.update(module).await?;
        self.invalidate_scope(module.tenant_id, module.school_level_id)
            .await;
        Ok(updated)
    }

    fn backend_name(&self) -> &'static str {
        "redis-cached"
    }
}

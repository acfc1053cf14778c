//! In-memory module store.
//!
//! Rows live in a `HashMap` behind a `tokio::sync::RwLock`. Not durable: used
//! by tests, local development and the CLI's dry runs.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use scolaguard_models::{
    Module, ModuleType, NewModule,
    ids::{SchoolLevelId, TenantId},
};

use super::{ModuleStore, StoreError, StoreResult};

type RowKey = (TenantId, SchoolLevelId, ModuleType);

#[derive(Debug, Clone, Default)]
pub struct MemoryModuleStore {
    rows: Arc<RwLock<HashMap<RowKey, Module>>>,
}

impl MemoryModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl ModuleStore for MemoryModuleStore {
    async fn find_enabled(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>> {
        let rows = self.rows.read().await;
        Ok(rows
            .get(&(tenant_id, school_level_id, module_type))
            .filter(|m| m.is_operational())
            .cloned())
    }

    async fn find_by_type(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>> {
        let rows = self.rows.read().await;
        Ok(rows.get(&(tenant_id, school_level_id, module_type)).cloned())
    }

    async fn list(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Vec<Module>> {
        let rows = self.rows.read().await;
        let mut modules: Vec<Module> = rows
            .values()
            .filter(|m| m.tenant_id == tenant_id && m.school_level_id == school_level_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.module_type);
        Ok(modules)
    }

    async fn create(&self, module: NewModule) -> StoreResult<Module> {
        let key = (module.tenant_id, module.school_level_id, module.module_type);
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "module {} already exists for this school level",
                module.module_type
            )));
        }

        let created = module.into_module(Utc::now());
        rows.insert(key, created.clone());
        Ok(created)
    }

    async fn update(&self, module: &Module) -> StoreResult<Module> {
        let key = (module.tenant_id, module.school_level_id, module.module_type);
        let mut rows = self.rows.write().await;
        let Some(existing) = rows.get_mut(&key) else {
            return Err(StoreError::NotFound(format!("module {}", module.module_type)));
        };

        existing.enabled = module.enabled;
        existing.status = module.status;
        existing.dependencies = module.dependencies.clone();
        existing.required_permissions = module.required_permissions.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

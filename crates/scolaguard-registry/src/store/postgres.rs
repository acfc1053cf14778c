//! Postgres module store.
//!
//! Uniqueness of (tenant_id, module_type, school_level_id) is enforced by the
//! `modules_scope_unique` index; a violation surfaces as [`StoreError::Conflict`].

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use scolaguard_models::{
    Module, ModuleType, NewModule,
    ids::{ModuleId, SchoolLevelId, TenantId},
};

use super::{ModuleStore, StoreError, StoreResult};

const MODULE_COLUMNS: &str = "id, tenant_id, school_level_id, module_type, enabled, status, \
     dependencies, required_permissions, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PgModuleStore {
    pool: PgPool,
}

impl PgModuleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err.code().map(|code| code == "23505").unwrap_or(false);
    }
    false
}

#[async_trait]
impl ModuleStore for PgModuleStore {
    #[instrument(skip(self))]
    async fn find_enabled(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>> {
        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM modules \
             WHERE tenant_id = $1 AND module_type = $2 AND school_level_id = $3 \
             AND enabled = TRUE AND status = 'active'"
        );
        let row = sqlx::query_as::<_, Module>(&query)
            .bind(tenant_id)
            .bind(module_type)
            .bind(school_level_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn find_by_type(
        &self,
        tenant_id: TenantId,
        module_type: ModuleType,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Option<Module>> {
        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM modules \
             WHERE tenant_id = $1 AND module_type = $2 AND school_level_id = $3"
        );
        let row = sqlx::query_as::<_, Module>(&query)
            .bind(tenant_id)
            .bind(module_type)
            .bind(school_level_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        tenant_id: TenantId,
        school_level_id: SchoolLevelId,
    ) -> StoreResult<Vec<Module>> {
        let query = format!(
            "SELECT {MODULE_COLUMNS} FROM modules WHERE tenant_id = $1 AND school_level_id = $2"
        );
        let mut rows = sqlx::query_as::<_, Module>(&query)
            .bind(tenant_id)
            .bind(school_level_id)
            .fetch_all(&self.pool)
            .await?;
        // Declaration order, not the alphabetical order of the TEXT column.
        rows.sort_by_key(|m| m.module_type);
        Ok(rows)
    }

    #[instrument(skip(self, module), fields(module_type = %module.module_type))]
    async fn create(&self, module: NewModule) -> StoreResult<Module> {
        let query = format!(
            "INSERT INTO modules \
             (id, tenant_id, school_level_id, module_type, enabled, status, dependencies, required_permissions) \
             VALUES ($1, $2, $3, $4, $5, 'active', $6, $7) \
             RETURNING {MODULE_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, Module>(&query)
            .bind(ModuleId::new())
            .bind(module.tenant_id)
            .bind(module.school_level_id)
            .bind(module.module_type)
            .bind(module.enabled)
            .bind(&module.dependencies)
            .bind(&module.required_permissions)
            .fetch_one(&self.pool)
            .await;

        match inserted {
            Ok(row) => Ok(row),
            Err(err) if is_unique_violation(&err) => Err(StoreError::Conflict(format!(
                "module {} already exists for this school level",
                module.module_type
            ))),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self, module), fields(module_id = %module.id))]
    async fn update(&self, module: &Module) -> StoreResult<Module> {
        let query = format!(
            "UPDATE modules SET enabled = $2, status = $3, dependencies = $4, \
             required_permissions = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING {MODULE_COLUMNS}"
        );
        sqlx::query_as::<_, Module>(&query)
            .bind(module.id)
            .bind(module.enabled)
            .bind(module.status)
            .bind(&module.dependencies)
            .bind(&module.required_permissions)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("module {}", module.id)))
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}

use tracing::instrument;

use scolaguard_core::AppError;
use scolaguard_models::{
    DependencyStatus, Module, ModuleStatus, ModuleType, RequestContext, UpdateModuleStatusDto,
};
use scolaguard_registry::ModuleRegistry;

pub struct ModuleService;

impl ModuleService {
    #[instrument(skip(registry))]
    pub async fn list_modules(
        registry: &ModuleRegistry,
        ctx: RequestContext,
    ) -> Result<Vec<Module>, AppError> {
        registry
            .list(ctx.tenant_id(), ctx.school_level_id())
            .await
            .map_err(|e| e.into_app_error())
    }

    #[instrument(skip(registry))]
    pub async fn initialize_modules(
        registry: &ModuleRegistry,
        ctx: RequestContext,
    ) -> Result<Vec<Module>, AppError> {
        registry
            .initialize_defaults(ctx.tenant_id(), ctx.school_level_id())
            .await
            .map_err(|e| e.into_app_error())
    }

    #[instrument(skip(registry))]
    pub async fn get_module(
        registry: &ModuleRegistry,
        ctx: RequestContext,
        module_type: ModuleType,
    ) -> Result<Module, AppError> {
        registry
            .find(ctx.tenant_id(), module_type, ctx.school_level_id())
            .await
            .map_err(|e| e.into_app_error())?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Module {module_type} not found")))
    }

    #[instrument(skip(registry))]
    pub async fn get_dependencies(
        registry: &ModuleRegistry,
        ctx: RequestContext,
        module_type: ModuleType,
    ) -> Result<DependencyStatus, AppError> {
        let check = registry
            .dependencies_satisfied(ctx.tenant_id(), module_type, ctx.school_level_id())
            .await
            .map_err(|e| e.into_app_error())?;

        Ok(DependencyStatus {
            module_type,
            satisfied: check.satisfied,
            missing: check.missing,
        })
    }

    #[instrument(skip(registry))]
    pub async fn enable_module(
        registry: &ModuleRegistry,
        ctx: RequestContext,
        module_type: ModuleType,
    ) -> Result<Module, AppError> {
        registry
            .enable(ctx.tenant_id(), module_type, ctx.school_level_id())
            .await
            .map_err(|e| e.into_app_error())
    }

    #[instrument(skip(registry))]
    pub async fn disable_module(
        registry: &ModuleRegistry,
        ctx: RequestContext,
        module_type: ModuleType,
    ) -> Result<Module, AppError> {
        registry
            .disable(ctx.tenant_id(), module_type, ctx.school_level_id())
            .await
            .map_err(|e| e.into_app_error())
    }

    #[instrument(skip(registry))]
    pub async fn update_status(
        registry: &ModuleRegistry,
        ctx: RequestContext,
        module_type: ModuleType,
        dto: UpdateModuleStatusDto,
    ) -> Result<Module, AppError> {
        let status: ModuleStatus = dto.status;
        registry
            .set_status(ctx.tenant_id(), module_type, ctx.school_level_id(), status)
            .await
            .map_err(|e| e.into_app_error())
    }
}

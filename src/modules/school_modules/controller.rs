use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use scolaguard_core::AppError;
use scolaguard_models::{
    AccessMatrixEntry, ContextResponse, DependencyStatus, Module, ModuleType,
    UpdateModuleStatusDto,
};

use crate::metrics::track_module_toggle;
use crate::middleware::auth::{Caller, Scope};
use crate::modules::school_modules::model::{ErrorResponse, HealthResponse};
use crate::modules::school_modules::service::ModuleService;
use crate::state::AppState;
use crate::validator::ValidatedJson;

fn parse_module(raw: &str) -> Result<ModuleType, AppError> {
    raw.parse::<ModuleType>().map_err(AppError::bad_request)
}

#[utoipa::path(
    get,
    path = "/api/modules",
    params(
        ("x-tenant-id" = String, Header, description = "Tenant ID"),
        ("x-school-level-id" = String, Header, description = "School level ID")
    ),
    responses(
        (status = 200, description = "Modules of the school level", body = Vec<Module>),
        (status = 400, description = "Missing school level", body = ErrorResponse),
        (status = 403, description = "Missing tenant or insufficient permission", body = ErrorResponse)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn list_modules(
    State(state): State<AppState>,
    Scope(ctx): Scope,
) -> Result<Json<Vec<Module>>, AppError> {
    let modules = ModuleService::list_modules(state.registry(), ctx).await?;
    Ok(Json(modules))
}

#[utoipa::path(
    post,
    path = "/api/modules/initialize",
    responses(
        (status = 201, description = "Default modules seeded (existing rows kept)", body = Vec<Module>),
        (status = 403, description = "Requires modules.manage", body = ErrorResponse)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn initialize_modules(
    State(state): State<AppState>,
    Scope(ctx): Scope,
) -> Result<(StatusCode, Json<Vec<Module>>), AppError> {
    let modules = ModuleService::initialize_modules(state.registry(), ctx).await?;
    Ok((StatusCode::CREATED, Json(modules)))
}

#[utoipa::path(
    get,
    path = "/api/modules/matrix",
    responses(
        (status = 200, description = "Module-to-module access levels", body = Vec<AccessMatrixEntry>)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_access_matrix(State(state): State<AppState>) -> Json<Vec<AccessMatrixEntry>> {
    Json(state.engine.matrix().entries())
}

#[utoipa::path(
    get,
    path = "/api/modules/{module_type}",
    params(("module_type" = String, Path, description = "Module type, e.g. FINANCES")),
    responses(
        (status = 200, description = "Module row", body = Module),
        (status = 400, description = "Unknown module type", body = ErrorResponse),
        (status = 404, description = "Module not initialized for this school level", body = ErrorResponse)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_module(
    State(state): State<AppState>,
    Scope(ctx): Scope,
    Path(module_type): Path<String>,
) -> Result<Json<Module>, AppError> {
    let module_type = parse_module(&module_type)?;
    let module = ModuleService::get_module(state.registry(), ctx, module_type).await?;
    Ok(Json(module))
}

#[utoipa::path(
    get,
    path = "/api/modules/{module_type}/dependencies",
    params(("module_type" = String, Path, description = "Module type")),
    responses(
        (status = 200, description = "Whether every transitive dependency is enabled", body = DependencyStatus),
        (status = 400, description = "Unknown module type", body = ErrorResponse)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn get_module_dependencies(
    State(state): State<AppState>,
    Scope(ctx): Scope,
    Path(module_type): Path<String>,
) -> Result<Json<DependencyStatus>, AppError> {
    let module_type = parse_module(&module_type)?;
    let status = ModuleService::get_dependencies(state.registry(), ctx, module_type).await?;
    Ok(Json(status))
}

#[utoipa::path(
    post,
    path = "/api/modules/{module_type}/enable",
    params(("module_type" = String, Path, description = "Module type")),
    responses(
        (status = 200, description = "Module enabled", body = Module),
        (status = 403, description = "Dependencies not enabled or insufficient permission", body = ErrorResponse)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn enable_module(
    State(state): State<AppState>,
    Scope(ctx): Scope,
    Path(module_type): Path<String>,
) -> Result<Json<Module>, AppError> {
    let module_type = parse_module(&module_type)?;
    let module = ModuleService::enable_module(state.registry(), ctx, module_type).await?;
    track_module_toggle(module_type, true);
    Ok(Json(module))
}

#[utoipa::path(
    post,
    path = "/api/modules/{module_type}/disable",
    params(("module_type" = String, Path, description = "Module type")),
    responses(
        (status = 200, description = "Module disabled", body = Module),
        (status = 404, description = "Module not initialized", body = ErrorResponse),
        (status = 409, description = "Enabled modules depend on it", body = ErrorResponse)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn disable_module(
    State(state): State<AppState>,
    Scope(ctx): Scope,
    Path(module_type): Path<String>,
) -> Result<Json<Module>, AppError> {
    let module_type = parse_module(&module_type)?;
    let module = ModuleService::disable_module(state.registry(), ctx, module_type).await?;
    track_module_toggle(module_type, false);
    Ok(Json(module))
}

#[utoipa::path(
    put,
    path = "/api/modules/{module_type}/status",
    params(("module_type" = String, Path, description = "Module type")),
    request_body = UpdateModuleStatusDto,
    responses(
        (status = 200, description = "Status updated", body = Module),
        (status = 404, description = "Module not initialized", body = ErrorResponse),
        (status = 422, description = "Validation error", body = ErrorResponse)
    ),
    tag = "Modules",
    security(("bearer_auth" = []))
)]
#[instrument(skip(state))]
pub async fn update_module_status(
    State(state): State<AppState>,
    Scope(ctx): Scope,
    Path(module_type): Path<String>,
    ValidatedJson(dto): ValidatedJson<UpdateModuleStatusDto>,
) -> Result<Json<Module>, AppError> {
    let module_type = parse_module(&module_type)?;
    let module = ModuleService::update_status(state.registry(), ctx, module_type, dto).await?;
    Ok(Json(module))
}

/// The resolved scope and effective permissions of the caller.
#[utoipa::path(
    get,
    path = "/api/context",
    responses(
        (status = 200, description = "Resolved request context", body = ContextResponse),
        (status = 403, description = "Context or principal missing", body = ErrorResponse)
    ),
    tag = "Context",
    security(("bearer_auth" = []))
)]
#[instrument(skip(caller))]
pub async fn get_context(caller: Caller, Scope(ctx): Scope) -> Json<ContextResponse> {
    Json(ContextResponse {
        context: ctx,
        roles: caller.principal.roles,
        permissions: caller.permissions.into_iter().collect(),
        super_admin: caller.principal.is_super_admin,
    })
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module_store: state.registry().backend_name().to_string(),
    })
}

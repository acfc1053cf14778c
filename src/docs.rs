use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use scolaguard_models::{
    AccessLevel, AccessMatrixEntry, ContextResponse, DependencyStatus, Module, ModuleStatus,
    ModuleType, RequestContext, UpdateModuleStatusDto,
};

use crate::modules::school_modules::model::{ErrorResponse, HealthResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::school_modules::controller::health,
        crate::modules::school_modules::controller::get_context,
        crate::modules::school_modules::controller::list_modules,
        crate::modules::school_modules::controller::initialize_modules,
        crate::modules::school_modules::controller::get_access_matrix,
        crate::modules::school_modules::controller::get_module,
        crate::modules::school_modules::controller::get_module_dependencies,
        crate::modules::school_modules::controller::enable_module,
        crate::modules::school_modules::controller::disable_module,
        crate::modules::school_modules::controller::update_module_status,
    ),
    components(
        schemas(
            Module,
            ModuleType,
            ModuleStatus,
            AccessLevel,
            AccessMatrixEntry,
            DependencyStatus,
            UpdateModuleStatusDto,
            RequestContext,
            ContextResponse,
            ErrorResponse,
            HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Modules", description = "Per school level module enablement"),
        (name = "Context", description = "Resolved request scope"),
        (name = "Health", description = "Liveness")
    ),
    info(
        title = "Scolaguard API",
        version = "0.1.0",
        description = "Contextual authorization and module isolation for multi-tenant school platforms.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

//! The per-request authorization pipeline.
//!
//! ```text
//! extract context -> completeness -> isolation -> module registry
//!     -> access matrix -> roles/permissions -> handler
//! ```
//!
//! Every stage fails closed with an [`AuthzError`]; nothing is retried or
//! downgraded. [`Engine`] exposes the three entry points the HTTP guard
//! calls: [`Engine::resolve_context`], [`Engine::enforce_isolation`] and
//! [`Engine::authorize`]. Auditing wraps the whole pipeline and lives in
//! [`audit`].

pub mod access_matrix;
pub mod audit;
pub mod completeness;
pub mod context;
pub mod isolation;
pub mod permissions;
pub mod roles;
pub mod route_meta;

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::http::Method;
use tracing::{debug, instrument};

use scolaguard_core::{AppError, AuthzError};
use scolaguard_models::{ModuleType, Principal, RequestContext};
use scolaguard_registry::{AccessMatrix, ModuleRegistry};

use self::access_matrix::RequestIntent;
use self::context::RequestView;
use self::isolation::Payload;
use self::roles::RoleCatalog;
use self::route_meta::{RouteMeta, RouteTable};

/// Outcome of a successful [`Engine::authorize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorization {
    /// Effective permissions of the caller; every known permission for super-admins.
    pub permissions: BTreeSet<String>,
}

#[derive(Clone)]
pub struct Engine {
    registry: ModuleRegistry,
    matrix: &'static AccessMatrix,
    roles: Arc<dyn RoleCatalog>,
    routes: Arc<RouteTable>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("matrix_entries", &self.matrix.len())
            .field("routes", &self.routes.len())
            .finish()
    }
}

impl Engine {
    pub fn new(
        registry: ModuleRegistry,
        matrix: &'static AccessMatrix,
        roles: Arc<dyn RoleCatalog>,
        routes: RouteTable,
    ) -> Self {
        Self {
            registry,
            matrix,
            roles,
            routes: Arc::new(routes),
        }
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn matrix(&self) -> &'static AccessMatrix {
        self.matrix
    }

    pub fn route(&self, method: &Method, path: &str) -> Option<&RouteMeta> {
        self.routes.lookup(method, path)
    }

    /// Extracts and validates the scope. `Ok(None)` only on public routes.
    pub fn resolve_context(
        &self,
        view: &RequestView<'_>,
        route: &RouteMeta,
    ) -> Result<Option<RequestContext>, AuthzError> {
        let extracted = context::extract(view);
        let ctx = completeness::validate(&extracted, route)?;
        debug!(?ctx, public = route.public, "Context resolved");
        Ok(ctx)
    }

    /// Checks the payload against the context and returns it with scope
    /// fields injected where needed.
    pub fn enforce_isolation(
        &self,
        ctx: &RequestContext,
        principal: Option<&Principal>,
        payload: Payload,
    ) -> Result<Payload, AuthzError> {
        isolation::enforce(ctx, principal, payload)
    }

    /// Module, matrix, role and permission checks for a resolved request.
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn authorize(
        &self,
        principal: Option<&Principal>,
        ctx: Option<&RequestContext>,
        route: &RouteMeta,
        method: &Method,
        path: &str,
    ) -> Result<Authorization, AppError> {
        if route.public {
            return Ok(Authorization::default());
        }

        let principal = principal.ok_or(AuthzError::PrincipalNotFound)?;
        let ctx = ctx.ok_or(AuthzError::MissingContext { field: "tenantId" })?;

        let mut required: BTreeSet<String> = route.required_permissions.iter().cloned().collect();
        for module in modules_to_check(ctx, route) {
            let row = self
                .registry
                .require_operational(ctx.tenant_id(), module, ctx.school_level_id())
                .await
                .map_err(|e| e.into_app_error())?;
            if route.required_module == Some(module) {
                required.extend(row.required_permissions);
            }
        }

        access_matrix::evaluate(
            self.matrix,
            ctx.module_type(),
            access_matrix::target_module(path),
            RequestIntent::from_method(method),
        )?;

        let granted = if principal.is_super_admin {
            scolaguard_core::permissions::ALL
                .iter()
                .map(|p| p.to_string())
                .collect()
        } else {
            self.roles
                .permissions_for(&principal.roles)
                .await
                .map_err(AppError::internal)?
        };

        permissions::check(principal, &granted, &route.required_roles, &required)?;

        debug!(user_id = %principal.user_id, "Request authorized");
        Ok(Authorization {
            permissions: granted,
        })
    }
}

/// The request's own module and the module the route belongs to, once each.
fn modules_to_check(ctx: &RequestContext, route: &RouteMeta) -> Vec<ModuleType> {
    let mut modules: Vec<ModuleType> = ctx.module_type().into_iter().collect();
    if let Some(required) = route.required_module {
        if !modules.contains(&required) {
            modules.push(required);
        }
    }
    modules
}

use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};

use scolaguard_core::permissions::{MODULES_MANAGE, MODULES_READ};

use crate::engine::route_meta::{RouteMeta, RouteTable};
use crate::state::AppState;

use super::controller::{
    disable_module, enable_module, get_access_matrix, get_context, get_module,
    get_module_dependencies, health, initialize_modules, list_modules, update_module_status,
};

pub fn init_modules_router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/context", get(get_context))
        .route("/api/modules", get(list_modules))
        .route("/api/modules/initialize", post(initialize_modules))
        .route("/api/modules/matrix", get(get_access_matrix))
        .route("/api/modules/{module_type}", get(get_module))
        .route(
            "/api/modules/{module_type}/dependencies",
            get(get_module_dependencies),
        )
        .route("/api/modules/{module_type}/enable", post(enable_module))
        .route("/api/modules/{module_type}/disable", post(disable_module))
        .route("/api/modules/{module_type}/status", put(update_module_status))
}

/// Authorization rules for the routes above.
pub fn modules_route_table() -> RouteTable {
    let read = || RouteMeta::scoped().permissions([MODULES_READ]);
    let manage = || RouteMeta::scoped().permissions([MODULES_MANAGE]);

    RouteTable::new()
        .route(Method::GET, "/api/health", RouteMeta::public())
        .route(Method::GET, "/api/context", RouteMeta::scoped())
        .route(Method::GET, "/api/modules", read())
        .route(Method::POST, "/api/modules/initialize", manage())
        .route(Method::GET, "/api/modules/matrix", read())
        .route(Method::GET, "/api/modules/{module_type}", read())
        .route(Method::GET, "/api/modules/{module_type}/dependencies", read())
        .route(Method::POST, "/api/modules/{module_type}/enable", manage())
        .route(Method::POST, "/api/modules/{module_type}/disable", manage())
        .route(Method::PUT, "/api/modules/{module_type}/status", manage())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_route_has_a_rule() {
        let table = modules_route_table();
        assert_eq!(table.len(), 10);
        assert!(table.lookup(&Method::GET, "/api/health").unwrap().public);
        assert_eq!(
            table
                .lookup(&Method::POST, "/api/modules/{module_type}/enable")
                .unwrap()
                .required_permissions,
            vec![MODULES_MANAGE.to_string()]
        );
    }
}

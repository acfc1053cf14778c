use axum::http::{HeaderValue, Method, header};
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::docs::ApiDoc;
use crate::engine::route_meta::RouteTable;
use crate::logging::logging_middleware;
use crate::metrics::metrics_middleware;
use crate::middleware::audit::audit_middleware;
use crate::middleware::auth::authenticate;
use crate::middleware::guard::authorize_request;
use crate::modules::school_modules::{init_modules_router, modules_route_table};
use crate::state::AppState;

/// Authorization rules of every route this service mounts.
pub fn route_table() -> RouteTable {
    modules_route_table()
}

pub fn init_router(state: AppState) -> Router {
    init_router_with(state, Router::new())
}

/// Mounts `routes` next to the built-in ones, behind the same pipeline.
///
/// Paths in `routes` must be full (`/api/students/{id}`) and declared in the
/// engine's route table, otherwise the guard refuses them.
pub fn init_router_with(state: AppState, routes: Router<AppState>) -> Router {
    let guarded = with_engine_layers(init_modules_router().merge(routes), &state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(guarded)
        .with_state(state.clone())
        .layer(cors_layer(&state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
}

/// Authentication runs first, then audit, then the guard.
pub fn with_engine_layers(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authorize_request,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), audit_middleware))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = state
        .cors_config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static("x-tenant-id"),
            header::HeaderName::from_static("x-school-level-id"),
            header::HeaderName::from_static("x-module-type"),
            header::HeaderName::from_static("x-academic-year-id"),
        ])
        .allow_credentials(true)
}

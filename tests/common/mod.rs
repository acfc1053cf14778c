#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use scolaguard::engine::Engine;
use scolaguard::engine::audit::{AuditRecorder, MemoryAuditSink};
use scolaguard::engine::roles::StaticRoleCatalog;
use scolaguard::engine::route_meta::{RouteMeta, RouteTable};
use scolaguard::middleware::auth::{Caller, Scope};
use scolaguard::router::{init_router_with, route_table};
use scolaguard::state::AppState;
use scolaguard_auth::create_access_token;
use scolaguard_config::{AuditConfig, CorsConfig, JwtConfig, RegistryConfig};
use scolaguard_core::permissions::{FINANCES_READ, STUDENTS_MANAGE, STUDENTS_READ};
use scolaguard_models::ModuleType;
use scolaguard_models::ids::{SchoolLevelId, TenantId};
use scolaguard_registry::store::memory::MemoryModuleStore;
use scolaguard_registry::{AccessMatrix, ModuleRegistry};

pub struct TestApp {
    pub router: Router,
    pub registry: ModuleRegistry,
    pub audit: MemoryAuditSink,
    pub jwt_config: JwtConfig,
    pub tenant: TenantId,
    pub level: SchoolLevelId,
}

/// Stand-ins for feature routes mounted by a real deployment.
fn stub_routes() -> Router<AppState> {
    Router::new()
        .route("/api/students", get(echo).post(echo))
        .route("/api/fees", get(echo))
}

fn stub_route_table() -> RouteTable {
    RouteTable::new()
        .route(
            Method::GET,
            "/api/students",
            RouteMeta::scoped()
                .module(ModuleType::Scolarite)
                .permissions([STUDENTS_READ]),
        )
        .route(
            Method::POST,
            "/api/students",
            RouteMeta::scoped()
                .module(ModuleType::Scolarite)
                .permissions([STUDENTS_MANAGE]),
        )
        .route(
            Method::GET,
            "/api/fees",
            RouteMeta::scoped()
                .module(ModuleType::Finances)
                .permissions([FINANCES_READ]),
        )
}

/// Returns what the handler saw: the resolved scope and the body it received.
async fn echo(_caller: Caller, Scope(ctx): Scope, body: String) -> impl IntoResponse {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    (StatusCode::OK, Json(json!({ "context": ctx, "body": body })))
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(RegistryConfig::default()).await
}

pub async fn setup_test_app_with(registry_config: RegistryConfig) -> TestApp {
    let body_limit = registry_config.body_limit_bytes;
    let registry = ModuleRegistry::new(Arc::new(MemoryModuleStore::new()), registry_config);
    let audit = MemoryAuditSink::new();
    let jwt_config = test_jwt_config();

    let engine = Engine::new(
        registry.clone(),
        AccessMatrix::standard(),
        Arc::new(StaticRoleCatalog::school_defaults()),
        route_table().merge(stub_route_table()),
    );

    let state = AppState {
        engine,
        audit: AuditRecorder::spawn(Arc::new(audit.clone()), &AuditConfig::default()),
        jwt_config: jwt_config.clone(),
        cors_config: CorsConfig::default(),
        body_limit,
    };

    TestApp {
        router: init_router_with(state, stub_routes()),
        registry,
        audit,
        jwt_config,
        tenant: TenantId::new(),
        level: SchoolLevelId::new(),
    }
}

impl TestApp {
    /// Seeds the default modules for the app's own scope.
    pub async fn initialize(&self) {
        self.registry
            .initialize_defaults(self.tenant, self.level)
            .await
            .unwrap();
    }

    /// A token for a user of this app's tenant.
    pub fn token(&self, roles: &[&str]) -> String {
        self.token_for(Some(self.tenant), roles, false)
    }

    pub fn super_admin_token(&self) -> String {
        self.token_for(None, &["super_admin"], true)
    }

    pub fn token_for(&self, tenant: Option<TenantId>, roles: &[&str], super_admin: bool) -> String {
        create_access_token(
            Uuid::new_v4(),
            "user@school.test",
            tenant.map(|t| t.into_inner()),
            roles.iter().map(|r| r.to_string()).collect(),
            super_admin,
            &self.jwt_config,
        )
        .unwrap()
    }

    /// A request scoped to this app's tenant and school level.
    pub fn scoped(&self, method: Method, uri: &str, token: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header("x-tenant-id", self.tenant.to_string())
            .header("x-school-level-id", self.level.to_string())
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, body)
    }
}

pub fn json_body(value: Value) -> Body {
    Body::from(serde_json::to_string(&value).unwrap())
}

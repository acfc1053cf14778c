mod common;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use common::{json_body, setup_test_app};
use scolaguard_models::{ModuleStatus, ModuleType};
use serde_json::json;

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let app = setup_test_app().await;
    let token = app.token(&["admin"]);

    let mut ids = Vec::new();
    for _ in 0..2 {
        let request = app
            .scoped(Method::POST, "/api/modules/initialize", &token)
            .body(Body::empty())
            .unwrap();
        let (status, body) = app.send(request).await;
        assert_eq!(status, StatusCode::CREATED);

        let mut batch: Vec<String> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap().to_string())
            .collect();
        batch.sort();
        ids.push(batch);
    }

    assert_eq!(ids[0].len(), ModuleType::ALL.len());
    assert_eq!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_list_modules_of_scope() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["director"]);

    let request = app
        .scoped(Method::GET, "/api/modules", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    let modules = body.as_array().unwrap();
    assert_eq!(modules.len(), ModuleType::ALL.len());
    assert!(
        modules
            .iter()
            .all(|m| m["tenant_id"] == app.tenant.to_string())
    );
}

#[tokio::test]
async fn test_teacher_cannot_manage_modules() {
    let app = setup_test_app().await;
    let token = app.token(&["teacher"]);

    let request = app
        .scoped(Method::POST, "/api/modules/initialize", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "InsufficientPermission");
    assert_eq!(body["details"]["missing_permissions"][0], "modules.manage");
}

#[tokio::test]
async fn test_disabled_module_blocks_then_enable_allows() {
    let app = setup_test_app().await;
    app.initialize().await;
    app.registry
        .disable(app.tenant, ModuleType::Finances, app.level)
        .await
        .unwrap();
    let token = app.token(&["accountant"]);

    let request = app
        .scoped(Method::GET, "/api/fees", &token)
        .header("x-module-type", "FINANCES")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "ModuleDisabled");
    assert_eq!(body["details"]["module"], "FINANCES");

    let admin = app.token(&["admin"]);
    let request = app
        .scoped(Method::POST, "/api/modules/FINANCES/enable", &admin)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);

    let request = app
        .scoped(Method::GET, "/api/fees", &token)
        .header("x-module-type", "FINANCES")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_super_admin_does_not_bypass_module_enablement() {
    let app = setup_test_app().await;
    app.initialize().await;
    app.registry
        .disable(app.tenant, ModuleType::Finances, app.level)
        .await
        .unwrap();
    let token = app.super_admin_token();

    let request = app
        .scoped(Method::GET, "/api/fees", &token)
        .header("x-module-type", "FINANCES")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "ModuleDisabled");
}

#[tokio::test]
async fn test_maintenance_status_blocks_module() {
    let app = setup_test_app().await;
    app.initialize().await;
    let admin = app.token(&["admin"]);

    let request = app
        .scoped(Method::PUT, "/api/modules/finances/status", &admin)
        .header("content-type", "application/json")
        .body(json_body(json!({ "status": "maintenance", "reason": "closing" })))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], ModuleStatus::Maintenance.as_str());

    let request = app
        .scoped(Method::GET, "/api/fees", &app.token(&["accountant"]))
        .header("x-module-type", "FINANCES")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "ModuleDisabled");
}

#[tokio::test]
async fn test_enable_refused_while_dependency_disabled() {
    let app = setup_test_app().await;
    app.initialize().await;
    app.registry
        .disable(app.tenant, ModuleType::Finances, app.level)
        .await
        .unwrap();
    let admin = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/modules/CANTINE/enable", &admin)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "DependencyUnsatisfied");
    assert_eq!(body["details"]["missing_dependencies"], json!(["FINANCES"]));
}

#[tokio::test]
async fn test_dependencies_endpoint() {
    let app = setup_test_app().await;
    app.initialize().await;
    app.registry
        .disable(app.tenant, ModuleType::Finances, app.level)
        .await
        .unwrap();
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::GET, "/api/modules/TRANSPORT/dependencies", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["satisfied"], false);
    assert_eq!(body["missing"], json!(["FINANCES"]));
}

#[tokio::test]
async fn test_disable_refused_while_dependents_enabled() {
    let app = setup_test_app().await;
    app.initialize().await;
    let admin = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/modules/INSCRIPTIONS/disable", &admin)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("FINANCES"));
}

#[tokio::test]
async fn test_unknown_module_is_bad_request() {
    let app = setup_test_app().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::GET, "/api/modules/GYM", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_uninitialized_module_is_not_found() {
    let app = setup_test_app().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::GET, "/api/modules/FINANCES", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_matrix_endpoint_lists_entries() {
    let app = setup_test_app().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::GET, "/api/modules/matrix", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert!(entries.iter().any(|e| {
        e["source"] == "COMMUNICATION" && e["target"] == "SCOLARITE" && e["level"] == "READ"
    }));
}

#[tokio::test]
async fn test_teacher_missing_manage_permission() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["teacher"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(json_body(json!({ "name": "Awa" })))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "InsufficientPermission");
    assert_eq!(body["details"]["missing_permissions"], json!(["students.manage"]));
}

#[tokio::test]
async fn test_read_only_grant_blocks_cross_module_write() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "COMMUNICATION")
        .header("content-type", "application/json")
        .body(json_body(json!({ "name": "Awa" })))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "AccessDenied");

    let request = app
        .scoped(Method::GET, "/api/students", &token)
        .header("x-module-type", "COMMUNICATION")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
}

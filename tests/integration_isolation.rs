mod common;

use axum::http::{Method, StatusCode};
use common::{json_body, setup_test_app};
use scolaguard_models::ids::TenantId;
use serde_json::json;

#[tokio::test]
async fn test_write_payload_gets_scope_injected() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(json_body(json!({ "name": "Awa" })))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["name"], "Awa");
    assert_eq!(body["body"]["tenant_id"], app.tenant.to_string());
    assert_eq!(body["body"]["school_level_id"], app.level.to_string());
}

#[tokio::test]
async fn test_matching_scope_field_is_kept_as_sent() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(json_body(json!({ "name": "Awa", "tenantId": app.tenant.to_string() })))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["tenantId"], app.tenant.to_string());
    assert!(body["body"].get("tenant_id").is_none());
    assert_eq!(body["body"]["school_level_id"], app.level.to_string());
}

#[tokio::test]
async fn test_mismatched_body_tenant_is_rejected_not_corrected() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(json_body(
            json!({ "name": "Awa", "tenantId": TenantId::new().to_string() }),
        ))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "ScopeMismatch");
}

#[tokio::test]
async fn test_mismatch_inside_bulk_payload() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(json_body(json!([
            { "name": "Awa" },
            { "name": "Moussa", "school_level_id": TenantId::new().to_string() }
        ])))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "ScopeMismatch");
}

#[tokio::test]
async fn test_bulk_payload_injected_per_item() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(json_body(json!([{ "name": "Awa" }, { "name": "Moussa" }])))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    for item in body["body"].as_array().unwrap() {
        assert_eq!(item["tenant_id"], app.tenant.to_string());
    }
}

#[tokio::test]
async fn test_mismatched_query_filter_is_rejected() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(
            Method::GET,
            &format!("/api/students?tenant_id={}", TenantId::new()),
            &token,
        )
        .header("x-module-type", "SCOLARITE")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "ScopeMismatch");
}

#[tokio::test]
async fn test_super_admin_may_act_in_any_tenant() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.super_admin_token();

    let request = app
        .scoped(Method::GET, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["context"]["tenant_id"], app.tenant.to_string());
}

#[tokio::test]
async fn test_unreadable_write_body_is_rejected() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("tenantId=someone-else"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Request body must be valid JSON");
}

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use common::{json_body, setup_test_app};
use scolaguard_models::ids::TenantId;
use serde_json::json;

#[tokio::test]
async fn test_sensitive_write_records_request_and_outcome() {
    let app = setup_test_app().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/modules/initialize", &token)
        .header("user-agent", "scolaguard-tests")
        .header("x-forwarded-for", "10.1.2.3")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::CREATED);

    let records = app.audit.wait_for(2).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].action, "CREATE_MODULES_REQUESTED");
    assert_eq!(records[1].action, "CREATE_MODULES");
    for record in &records {
        assert_eq!(record.tenant_id, app.tenant);
        assert_eq!(record.resource, "modules");
        assert_eq!(record.resource_id.as_deref(), Some("initialize"));
        assert_eq!(record.ip_address.as_deref(), Some("10.1.2.3"));
        assert_eq!(record.user_agent.as_deref(), Some("scolaguard-tests"));
        assert!(record.user_id.is_some());
    }
}

#[tokio::test]
async fn test_denied_request_records_failure_with_kind() {
    let app = setup_test_app().await;
    let token = app.token(&["teacher"]);

    let request = app
        .scoped(Method::POST, "/api/modules/FINANCES/enable", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let records = app.audit.wait_for(2).await;
    let failure = records.iter().find(|r| r.is_failure()).unwrap();
    assert_eq!(failure.action, "CREATE_MODULES_FAILED");
    let changes = failure.changes.as_ref().unwrap();
    assert_eq!(changes["kind"], "InsufficientPermission");
    assert_eq!(changes["status"], 403);
}

#[tokio::test]
async fn test_failure_without_context_falls_back_to_stated_tenant() {
    let app = setup_test_app().await;
    let token = app.token(&["admin"]);

    // No school level: the guard refuses before a context exists.
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/modules/initialize")
        .header("authorization", format!("Bearer {}", token))
        .header("x-tenant-id", app.tenant.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let records = app.audit.wait_for(2).await;
    let failure = records.iter().find(|r| r.is_failure()).unwrap();
    assert_eq!(failure.tenant_id, app.tenant);
    assert_eq!(failure.changes.as_ref().unwrap()["kind"], "MissingContext");
}

#[tokio::test]
async fn test_anonymous_failure_uses_system_tenant() {
    let app = setup_test_app().await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/modules/initialize")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let records = app.audit.wait_for(2).await;
    assert!(records.iter().all(|r| r.tenant_id == TenantId::SYSTEM));
    assert!(records.iter().all(|r| r.user_id.is_none()));
}

#[tokio::test]
async fn test_secrets_are_not_recorded() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::POST, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .header("content-type", "application/json")
        .body(json_body(json!({
            "name": "Awa",
            "password": "hunter2",
            "guardian": { "pin": "0000", "phone": "+221" }
        })))
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let records = app.audit.wait_for(2).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].action, "CREATE_STUDENTS");
    let changes = records[1].changes.as_ref().unwrap();
    assert_eq!(changes["name"], "Awa");
    assert!(changes.get("password").is_none());
    assert!(changes["guardian"].get("pin").is_none());
    assert_eq!(changes["guardian"]["phone"], "+221");
}

#[tokio::test]
async fn test_plain_reads_are_not_audited() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::GET, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.audit.records().is_empty());
}

#[tokio::test]
async fn test_denied_plain_read_is_audited() {
    let app = setup_test_app().await;
    app.initialize().await;
    let token = app.token(&["student"]);

    let request = app
        .scoped(Method::GET, "/api/students", &token)
        .header("x-module-type", "SCOLARITE")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "InsufficientPermission");

    let records = app.audit.wait_for(1).await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].action, "READ_STUDENTS_FAILED");
    assert_eq!(records[0].tenant_id, app.tenant);
    let changes = records[0].changes.as_ref().unwrap();
    assert_eq!(changes["kind"], "InsufficientPermission");
    assert_eq!(changes["status"], 403);
}

#[tokio::test]
async fn test_sensitive_reads_are_audited() {
    let app = setup_test_app().await;
    let token = app.token(&["admin"]);

    let request = app
        .scoped(Method::GET, "/api/modules", &token)
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);

    let records = app.audit.wait_for(2).await;
    assert_eq!(records[0].action, "READ_MODULES_REQUESTED");
    assert_eq!(records[1].action, "READ_MODULES");
}

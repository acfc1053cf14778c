use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use scolaguard_core::{AppError, ErrorReport};
use scolaguard_models::{AuditRecord, Principal, RequestContext, ids::TenantId};

use crate::engine::audit::{action_name, sanitize};
use crate::engine::context::{AmbientScope, ContextField, RequestView, resolve_field};
use crate::state::AppState;

/// Records sensitive operations before they run and their outcome after.
///
/// Writes are always audited, reads of sensitive resources too. Other reads
/// leave a `{ACTION}_FAILED` record only when authorization refused them. The
/// `{ACTION}_REQUESTED` record is queued before the handler runs; the outcome
/// record (`{ACTION}` or `{ACTION}_FAILED`) after. Recording never blocks the
/// request and never changes its response.
pub async fn audit_middleware(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let (resource, resource_id) = resource_of(&path);

    if !state.audit.is_enabled() {
        return next.run(req).await;
    }
    if !state.audit.is_sensitive(&method, &resource) {
        return audit_denials_only(&state, req, next, &method, &resource, resource_id).await;
    }

    let (parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let mut record = base_record(&parts, &method, &resource);
            record.action = format!("{}_FAILED", action_name(&method, &resource));
            record.resource_id = resource_id;
            record.changes = Some(json!({ "error": "Request body too large", "status": 413 }));
            state.audit.record(record);
            return AppError::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                anyhow::anyhow!("Request body too large"),
            )
            .into_response();
        }
    };
    let payload: Option<Value> = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .map(|v| sanitize(&v));

    let action = action_name(&method, &resource);
    let mut base = base_record(&parts, &method, &resource);
    base.resource_id = resource_id;
    base.changes = payload.clone();

    let mut requested = base.clone();
    requested.action = format!("{action}_REQUESTED");
    state.audit.record(requested);

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let mut outcome = base;
    outcome.created_at = chrono::Utc::now();
    if let Some(ctx) = response.extensions().get::<RequestContext>() {
        outcome.tenant_id = ctx.tenant_id();
    }

    let report = response.extensions().get::<ErrorReport>();
    if report.is_some() || !response.status().is_success() {
        outcome.action = format!("{action}_FAILED");
        let mut failure = json!({ "status": response.status().as_u16() });
        if let Some(report) = report {
            failure["error"] = json!(report.message);
            if let Some(kind) = report.kind {
                failure["kind"] = json!(kind);
            }
        }
        if let Some(payload) = payload {
            failure["request"] = payload;
        }
        outcome.changes = Some(failure);
    } else {
        outcome.action = action;
    }
    state.audit.record(outcome);

    response
}

/// Routine reads are recorded only when the pipeline refused them.
async fn audit_denials_only(
    state: &AppState,
    req: Request,
    next: Next,
    method: &Method,
    resource: &str,
    resource_id: Option<String>,
) -> Response {
    let (parts, body) = req.into_parts();
    let mut record = base_record(&parts, method, resource);
    let response = next.run(Request::from_parts(parts, body)).await;

    let denial = response
        .extensions()
        .get::<ErrorReport>()
        .and_then(|report| report.kind.map(|kind| (kind, report.message.clone())));
    let Some((kind, message)) = denial else {
        return response;
    };

    if let Some(ctx) = response.extensions().get::<RequestContext>() {
        record.tenant_id = ctx.tenant_id();
    }
    record.action = format!("{}_FAILED", action_name(method, resource));
    record.resource_id = resource_id;
    record.changes = Some(json!({
        "status": response.status().as_u16(),
        "error": message,
        "kind": kind,
    }));
    state.audit.record(record);

    response
}

/// `/api/modules/FINANCES/enable` is resource `modules`, id `FINANCES`.
fn resource_of(path: &str) -> (String, Option<String>) {
    let mut segments = path
        .trim_start_matches('/')
        .trim_start_matches("api/")
        .split('/')
        .filter(|s| !s.is_empty());
    let resource = segments.next().unwrap_or("root").to_lowercase();
    let resource_id = segments.next().map(str::to_string);
    (resource, resource_id)
}

fn base_record(parts: &Parts, method: &Method, resource: &str) -> AuditRecord {
    let (headers, extensions) = (&parts.headers, &parts.extensions);
    let principal = extensions.get::<Principal>();
    let mut record = AuditRecord::new(action_name(method, resource), resource);
    record.user_id = principal.map(|p| p.user_id);
    record.tenant_id = tenant_hint(parts)
        .or_else(|| principal.and_then(|p| p.tenant_id))
        .unwrap_or(TenantId::SYSTEM);
    record.ip_address = client_ip(headers, extensions);
    record.user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    record
}

/// The tenant as the client stated it. The guard has not validated it yet.
fn tenant_hint(parts: &Parts) -> Option<TenantId> {
    let query: HashMap<String, String> = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
        .map(|Query(q)| q)
        .unwrap_or_default();
    let view = RequestView {
        resolved: parts.extensions.get::<RequestContext>(),
        ambient: parts.extensions.get::<AmbientScope>(),
        headers: &parts.headers,
        query: &query,
        body: None,
    };
    resolve_field(&view, ContextField::Tenant).and_then(|(_, value)| value.parse().ok())
}

fn client_ip(headers: &HeaderMap, extensions: &axum::http::Extensions) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_resource_of_api_paths() {
        assert_eq!(
            resource_of("/api/modules/FINANCES/enable"),
            ("modules".to_string(), Some("FINANCES".to_string()))
        );
        assert_eq!(resource_of("/api/audit-logs"), ("audit-logs".to_string(), None));
        assert_eq!(resource_of("/"), ("root".to_string(), None));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 10.0.0.2"));
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));

        let ip = client_ip(&headers, &axum::http::Extensions::new());
        assert_eq!(ip.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn test_tenant_hint_from_header_then_query() {
        let tenant = TenantId::new();
        let (parts, _) = axum::http::Request::builder()
            .uri("/api/modules")
            .header("x-tenant-id", tenant.to_string())
            .body(Body::empty())
            .unwrap()
            .into_parts();
        assert_eq!(tenant_hint(&parts), Some(tenant));

        let other = TenantId::new();
        let (parts, _) = axum::http::Request::builder()
            .uri(format!("/api/modules?tenantId={other}"))
            .body(Body::empty())
            .unwrap()
            .into_parts();
        assert_eq!(tenant_hint(&parts), Some(other));
    }
}

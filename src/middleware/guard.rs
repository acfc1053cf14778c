//! Runs the authorization pipeline in front of every guarded route.
//!
//! The body is buffered (up to the configured limit) so scope fields can be
//! read from it and injected into it. On success the handler receives the
//! rewritten body, the [`RequestContext`] and the [`Authorization`] as
//! request extensions. The resolved context is also attached to the
//! response, failed or not, for the audit layer.

use std::collections::HashMap;

use axum::{
    body::{Body, Bytes},
    extract::{MatchedPath, Query, Request, State},
    http::{Extensions, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::warn;

use scolaguard_core::{AppError, AuthzError};
use scolaguard_models::{Principal, RequestContext};

use crate::engine::access_matrix::RequestIntent;
use crate::engine::context::{AmbientScope, RequestView};
use crate::engine::isolation::Payload;
use crate::metrics::track_authz_denial;
use crate::state::AppState;

pub async fn authorize_request(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let Some(path) = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
    else {
        return deny(
            AuthzError::AccessDenied("route has no authorization rule".to_string()).into(),
            None,
        );
    };

    let Some(route) = state.engine.route(&method, &path).cloned() else {
        warn!(%method, %path, "Guarded route without authorization metadata");
        return deny(
            AuthzError::AccessDenied(format!("no authorization rule for {method} {path}")).into(),
            None,
        );
    };

    let (mut parts, body) = req.into_parts();
    let bytes = match axum::body::to_bytes(body, state.body_limit).await {
        Ok(bytes) => bytes,
        Err(_) => return payload_too_large(),
    };
    // A write body the isolation check cannot read is refused outright.
    let json: Option<Value> = if bytes.is_empty() {
        None
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) if is_write(&method) => {
                warn!(%method, %path, error = %e, "Unreadable write body");
                return AppError::bad_request(anyhow::anyhow!("Request body must be valid JSON"))
                    .into_response();
            }
            Err(_) => None,
        }
    };
    let query = parse_query(&parts.uri);
    let principal = parts.extensions.get::<Principal>().cloned();

    let resolved = {
        let view = RequestView {
            resolved: parts.extensions.get::<RequestContext>(),
            ambient: parts.extensions.get::<AmbientScope>(),
            headers: &parts.headers,
            query: &query,
            body: json.as_ref(),
        };
        state.engine.resolve_context(&view, &route)
    };
    let ctx = match resolved {
        Ok(ctx) => ctx,
        Err(e) => return deny(e.into(), None),
    };

    let mut body = bytes;
    if let Some(ctx) = &ctx {
        let payload = Payload::new(is_write(&method), query, json);
        let enforced = match state
            .engine
            .enforce_isolation(ctx, principal.as_ref(), payload)
        {
            Ok(enforced) => enforced,
            Err(e) => return deny(e.into(), Some(*ctx)),
        };

        if enforced.writable {
            if let Some(value) = &enforced.body {
                match serde_json::to_vec(value) {
                    Ok(rewritten) => {
                        body = Bytes::from(rewritten);
                        parts.headers.remove(header::CONTENT_LENGTH);
                    }
                    Err(e) => return deny(AppError::internal(e), Some(*ctx)),
                }
            }
        }

        if let Err(e) = attach_context(&mut parts.extensions, *ctx) {
            return deny(e.into(), Some(*ctx));
        }
    }

    let authorization = match state
        .engine
        .authorize(
            principal.as_ref(),
            ctx.as_ref(),
            &route,
            &method,
            parts.uri.path(),
        )
        .await
    {
        Ok(authorization) => authorization,
        Err(e) => return deny(e, ctx),
    };
    parts.extensions.insert(authorization);

    let mut response = next.run(Request::from_parts(parts, Body::from(body))).await;
    if let Some(ctx) = ctx {
        response.extensions_mut().insert(ctx);
    }
    response
}

/// Attaches `ctx` to a request, refusing to replace a different context.
pub fn attach_context(extensions: &mut Extensions, ctx: RequestContext) -> Result<(), AuthzError> {
    if let Some(existing) = extensions.get::<RequestContext>() {
        existing.reconcile(&ctx)?;
    }
    extensions.insert(ctx);
    Ok(())
}

fn parse_query(uri: &axum::http::Uri) -> HashMap<String, String> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .map(|Query(query)| query)
        .unwrap_or_default()
}

fn deny(err: AppError, ctx: Option<RequestContext>) -> Response {
    if let Some(kind) = err.kind {
        warn!(%kind, reason = %err.error, "Request denied");
        track_authz_denial(kind);
    }
    let mut response = err.into_response();
    if let Some(ctx) = ctx {
        response.extensions_mut().insert(ctx);
    }
    response
}

fn payload_too_large() -> Response {
    AppError::new(
        StatusCode::PAYLOAD_TOO_LARGE,
        anyhow::anyhow!("Request body too large"),
    )
    .into_response()
}

/// Methods whose payload may carry scope fields to inject.
pub fn is_write(method: &Method) -> bool {
    RequestIntent::from_method(method) == RequestIntent::Write
}

#[cfg(test)]
mod tests {
    use super::*;
    use scolaguard_models::{
        ModuleType,
        ids::{SchoolLevelId, TenantId},
    };

    #[test]
    fn test_attach_context_accepts_same_scope() {
        let ctx = RequestContext::new(TenantId::new(), SchoolLevelId::new());
        let mut extensions = Extensions::new();

        attach_context(&mut extensions, ctx).unwrap();
        attach_context(&mut extensions, ctx.with_module(ModuleType::Examens)).unwrap();

        assert_eq!(
            extensions.get::<RequestContext>().unwrap().module_type(),
            Some(ModuleType::Examens)
        );
    }

    #[test]
    fn test_attach_context_rejects_conflict() {
        let level = SchoolLevelId::new();
        let mut extensions = Extensions::new();
        attach_context(&mut extensions, RequestContext::new(TenantId::new(), level)).unwrap();

        let err =
            attach_context(&mut extensions, RequestContext::new(TenantId::new(), level)).unwrap_err();
        assert!(matches!(err, AuthzError::ScopeMismatch(_)));
    }

    #[test]
    fn test_query_parsing() {
        let uri: axum::http::Uri = "/api/modules?tenantId=abc&x=1".parse().unwrap();
        let query = parse_query(&uri);
        assert_eq!(query.get("tenantId").map(String::as_str), Some("abc"));
    }
}

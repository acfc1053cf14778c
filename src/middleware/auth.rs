use std::collections::BTreeSet;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use scolaguard_auth::verify_token;
use scolaguard_core::{AppError, AuthzError};
use scolaguard_models::{Principal, RequestContext};

use crate::engine::Authorization;
use crate::state::AppState;

/// Verifies a bearer token when one is present and attaches the [`Principal`].
///
/// A request without an `Authorization` header continues anonymously; the
/// guard decides whether the route allows that. A header that is present but
/// malformed, expired or forged is rejected with 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| AppError::unauthorized("Invalid authorization header".to_string()))?;
        let token = value.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = verify_token(token, &state.jwt_config)?;
        let principal = claims.principal()?;
        req.extensions_mut().insert(principal);
    }

    Ok(next.run(req).await)
}

/// The authenticated caller and its effective permissions.
#[derive(Debug, Clone)]
pub struct Caller {
    pub principal: Principal,
    pub permissions: BTreeSet<String>,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthzError::PrincipalNotFound)?;
        let permissions = parts
            .extensions
            .get::<Authorization>()
            .map(|a| a.permissions.clone())
            .unwrap_or_default();

        Ok(Caller {
            principal,
            permissions,
        })
    }
}

/// The context resolved by the guard.
#[derive(Debug, Clone, Copy)]
pub struct Scope(pub RequestContext);

impl<S> FromRequestParts<S> for Scope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .copied()
            .map(Scope)
            .ok_or_else(|| AuthzError::MissingContext { field: "tenantId" }.into())
    }
}

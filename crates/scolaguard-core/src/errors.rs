//! Error types for the authorization pipeline.
//!
//! Pipeline stages fail with an [`AuthzError`], one variant per taxonomy kind.
//! Handlers and middleware return [`AppError`], which wraps any error with an
//! HTTP status. Converting an `AuthzError` into an `AppError` (including via `?`)
//! keeps its kind, so the client always receives
//!
//! ```json
//! { "error": "<reason>", "kind": "<Kind>", "details": { ... } }
//! ```
//!
//! and never a stack trace.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value, json};

/// Taxonomy of authorization failures surfaced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingContext,
    ScopeMismatch,
    ModuleDisabled,
    DependencyUnsatisfied,
    AccessDenied,
    InsufficientPermission,
    PrincipalNotFound,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingContext => "MissingContext",
            Self::ScopeMismatch => "ScopeMismatch",
            Self::ModuleDisabled => "ModuleDisabled",
            Self::DependencyUnsatisfied => "DependencyUnsatisfied",
            Self::AccessDenied => "AccessDenied",
            Self::InsufficientPermission => "InsufficientPermission",
            Self::PrincipalNotFound => "PrincipalNotFound",
        }
    }

    /// Missing context is a client error; everything else is a refusal.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingContext => StatusCode::BAD_REQUEST,
            _ => StatusCode::FORBIDDEN,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal failure raised by one of the pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    #[error("{field} could not be resolved for this request")]
    MissingContext { field: &'static str },

    #[error("{field} has an invalid value: {value:?}")]
    InvalidContext { field: &'static str, value: String },

    #[error("{0}")]
    ScopeMismatch(String),

    #[error("module {module} is not enabled for this school level")]
    ModuleDisabled { module: String },

    #[error("module {module} requires modules that are not enabled: {}", .missing.join(", "))]
    DependencyUnsatisfied { module: String, missing: Vec<String> },

    #[error("{0}")]
    AccessDenied(String),

    #[error("{}", describe_insufficient(.missing_permissions, .required_roles))]
    InsufficientPermission {
        missing_permissions: Vec<String>,
        required_roles: Vec<String>,
    },

    #[error("an authenticated principal is required for this route")]
    PrincipalNotFound,
}

fn describe_insufficient(missing_permissions: &[String], required_roles: &[String]) -> String {
    if missing_permissions.is_empty() {
        format!(
            "Access denied. Required one of roles: {}",
            required_roles.join(", ")
        )
    } else {
        format!(
            "Access denied. Missing required permissions: {}",
            missing_permissions.join(", ")
        )
    }
}

impl AuthzError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingContext { .. } | Self::InvalidContext { .. } => ErrorKind::MissingContext,
            Self::ScopeMismatch(_) => ErrorKind::ScopeMismatch,
            Self::ModuleDisabled { .. } => ErrorKind::ModuleDisabled,
            Self::DependencyUnsatisfied { .. } => ErrorKind::DependencyUnsatisfied,
            Self::AccessDenied(_) => ErrorKind::AccessDenied,
            Self::InsufficientPermission { .. } => ErrorKind::InsufficientPermission,
            Self::PrincipalNotFound => ErrorKind::PrincipalNotFound,
        }
    }

    /// A missing tenant is an authorization failure, not a malformed request.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingContext { field } if *field == "tenantId" => StatusCode::FORBIDDEN,
            _ => self.kind().status(),
        }
    }

    /// Machine-readable detail for clients (missing permissions, dependencies).
    pub fn details(&self) -> Option<Value> {
        match self {
            Self::MissingContext { field } | Self::InvalidContext { field, .. } => {
                Some(json!({ "field": field }))
            }
            Self::ModuleDisabled { module } => Some(json!({ "module": module })),
            Self::DependencyUnsatisfied { module, missing } => Some(json!({
                "module": module,
                "missing_dependencies": missing,
            })),
            Self::InsufficientPermission {
                missing_permissions,
                required_roles,
            } => {
                let mut details = Map::new();
                if !missing_permissions.is_empty() {
                    details.insert("missing_permissions".into(), json!(missing_permissions));
                }
                if !required_roles.is_empty() {
                    details.insert("required_roles".into(), json!(required_roles));
                }
                Some(Value::Object(details))
            }
            _ => None,
        }
    }
}

/// Summary of a failed request, attached to error responses as an extension
/// so outer layers (audit, metrics) can read it without parsing the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub kind: Option<ErrorKind>,
    pub message: String,
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub kind: Option<ErrorKind>,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            kind: None,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn conflict<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::CONFLICT, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn unauthorized(message: String) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(message))
    }

    pub fn forbidden(message: String) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message))
    }

    pub fn internal_error(message: String) -> Self {
        Self::internal(anyhow::anyhow!(message))
    }

    /// The pipeline failure behind this error, if it came from one.
    pub fn authz(&self) -> Option<&AuthzError> {
        self.error.downcast_ref::<AuthzError>()
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            status: self.status,
            kind: self.kind,
            message: self.error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = self.report();

        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = ?self.error, "Request failed");
        }

        let mut body = json!({ "error": report.message });
        if let Some(kind) = self.kind {
            body["kind"] = json!(kind);
        }
        if let Some(details) = self.authz().and_then(AuthzError::details) {
            body["details"] = details;
        }

        let mut response = (self.status, Json(body)).into_response();
        response.extensions_mut().insert(report);
        response
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        match error.downcast_ref::<AuthzError>() {
            Some(authz) => Self {
                status: authz.status(),
                kind: Some(authz.kind()),
                error,
            },
            None => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                kind: None,
                error,
            },
        }
    }
}

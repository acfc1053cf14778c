//! Tenant and school-level isolation.
//!
//! A principal bound to a tenant may only act inside that tenant. Scope
//! fields supplied in the payload must agree with the resolved context and
//! are never corrected. Write payloads that omit them get the resolved
//! values injected; read filters are left untouched.

use std::collections::HashMap;

use serde_json::{Map, Value};

use scolaguard_core::AuthzError;
use scolaguard_models::{Principal, RequestContext};

use super::context::ContextField;

/// The caller-supplied parts of a request that may carry scope fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    /// Create or update request; only these get scope fields injected.
    pub writable: bool,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

impl Payload {
    pub fn new(writable: bool, query: HashMap<String, String>, body: Option<Value>) -> Self {
        Self {
            writable,
            query,
            body,
        }
    }
}

const INJECTED_TENANT_KEY: &str = "tenant_id";
const INJECTED_LEVEL_KEY: &str = "school_level_id";

pub fn enforce(
    ctx: &RequestContext,
    principal: Option<&Principal>,
    mut payload: Payload,
) -> Result<Payload, AuthzError> {
    if let Some(principal) = principal {
        check_principal(ctx, principal)?;
    }

    let expected = [
        (ContextField::Tenant, ctx.tenant_id().to_string()),
        (ContextField::SchoolLevel, ctx.school_level_id().to_string()),
    ];

    for (field, expected) in &expected {
        for key in field.keys() {
            if let Some(value) = payload.query.get(*key) {
                check_value(*field, expected, value)?;
            }
        }
    }

    if let Some(body) = &payload.body {
        for object in objects(body) {
            check_object(object, &expected)?;
        }
    }

    if payload.writable {
        if let Some(body) = payload.body.as_mut() {
            inject(body, ctx);
        }
    }

    Ok(payload)
}

fn check_principal(ctx: &RequestContext, principal: &Principal) -> Result<(), AuthzError> {
    match principal.tenant_id {
        Some(tenant_id) if tenant_id != ctx.tenant_id() => Err(AuthzError::ScopeMismatch(
            "the authenticated user does not belong to the requested tenant".to_string(),
        )),
        _ => Ok(()),
    }
}

fn check_object(
    object: &Map<String, Value>,
    expected: &[(ContextField, String)],
) -> Result<(), AuthzError> {
    for (field, expected) in expected {
        for key in field.keys() {
            match object.get(*key) {
                None => {}
                Some(value) if is_blank(value) => {}
                Some(Value::String(value)) => check_value(*field, expected, value)?,
                Some(other) => check_value(*field, expected, &other.to_string())?,
            }
        }
    }
    Ok(())
}

fn check_value(field: ContextField, expected: &str, supplied: &str) -> Result<(), AuthzError> {
    let supplied = supplied.trim();
    if supplied.is_empty() || supplied.eq_ignore_ascii_case(expected) {
        return Ok(());
    }
    Err(AuthzError::ScopeMismatch(format!(
        "{} in the request does not match the resolved context",
        field.name()
    )))
}

/// The body itself when it is an object, its object elements when it is an array.
fn objects(body: &Value) -> Vec<&Map<String, Value>> {
    match body {
        Value::Object(object) => vec![object],
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn inject(body: &mut Value, ctx: &RequestContext) {
    match body {
        Value::Object(object) => inject_object(object, ctx),
        Value::Array(items) => items
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .for_each(|object| inject_object(object, ctx)),
        _ => {}
    }
}

fn inject_object(object: &mut Map<String, Value>, ctx: &RequestContext) {
    let scope = [
        (ContextField::Tenant, INJECTED_TENANT_KEY, ctx.tenant_id().to_string()),
        (
            ContextField::SchoolLevel,
            INJECTED_LEVEL_KEY,
            ctx.school_level_id().to_string(),
        ),
    ];

    for (field, key, value) in scope {
        let mut present = false;
        for k in field.keys() {
            match object.get_mut(*k) {
                None => {}
                Some(supplied) if is_blank(supplied) => {
                    *supplied = Value::String(value.clone());
                    present = true;
                }
                Some(_) => present = true,
            }
        }
        if !present {
            object.insert(key.to_string(), Value::String(value));
        }
    }
}

/// `null` and empty strings count as an omitted scope field.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

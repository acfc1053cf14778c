//! Turns extracted values into a [`RequestContext`], or refuses the request.
//!
//! Nothing is defaulted or inferred. A non-public route without a tenant is
//! an authorization failure; a missing school level, or a missing module on
//! a route that declares one, is a malformed request.

use std::str::FromStr;

use scolaguard_core::AuthzError;
use scolaguard_models::{
    ModuleType, RequestContext,
    ids::{AcademicYearId, SchoolLevelId, TenantId},
};

use super::context::{ContextField, ExtractedContext};
use super::route_meta::RouteMeta;

/// `Ok(None)` only for public routes that carry no usable scope.
pub fn validate(
    extracted: &ExtractedContext,
    route: &RouteMeta,
) -> Result<Option<RequestContext>, AuthzError> {
    if route.public {
        return Ok(build(extracted, false).ok());
    }
    build(extracted, route.required_module.is_some()).map(Some)
}

fn build(extracted: &ExtractedContext, module_required: bool) -> Result<RequestContext, AuthzError> {
    let tenant_id: TenantId = required(extracted, ContextField::Tenant)?;
    let school_level_id: SchoolLevelId = required(extracted, ContextField::SchoolLevel)?;
    let mut ctx = RequestContext::new(tenant_id, school_level_id);

    match optional::<ModuleType>(extracted, ContextField::Module)? {
        Some(module_type) => ctx = ctx.with_module(module_type),
        None if module_required => {
            return Err(AuthzError::MissingContext {
                field: ContextField::Module.name(),
            });
        }
        None => {}
    }

    if let Some(year) = optional::<AcademicYearId>(extracted, ContextField::AcademicYear)? {
        ctx = ctx.with_academic_year(year);
    }

    Ok(ctx)
}

fn required<T: FromStr>(extracted: &ExtractedContext, field: ContextField) -> Result<T, AuthzError> {
    optional(extracted, field)?.ok_or(AuthzError::MissingContext {
        field: field.name(),
    })
}

fn optional<T: FromStr>(
    extracted: &ExtractedContext,
    field: ContextField,
) -> Result<Option<T>, AuthzError> {
    extracted
        .get(field)
        .map(|raw| {
            raw.parse().map_err(|_| AuthzError::InvalidContext {
                field: field.name(),
                value: raw.to_string(),
            })
        })
        .transpose()
}

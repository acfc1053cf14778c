//! Context extraction.
//!
//! Each scope field is looked up through an ordered list of sources. The
//! first source yielding a non-empty value wins and later sources are not
//! consulted for that field. Extraction never fails: a field nobody supplied
//! is simply absent, and validation happens in
//! [`completeness`](super::completeness).

use std::collections::HashMap;

use axum::http::HeaderMap;
use serde_json::Value;
use tracing::trace;

use scolaguard_models::{
    ModuleType, RequestContext,
    ids::{AcademicYearId, SchoolLevelId, TenantId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextField {
    Tenant,
    SchoolLevel,
    Module,
    AcademicYear,
}

impl ContextField {
    pub const ALL: [ContextField; 4] = [
        ContextField::Tenant,
        ContextField::SchoolLevel,
        ContextField::Module,
        ContextField::AcademicYear,
    ];

    /// Name used in error details.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tenant => "tenantId",
            Self::SchoolLevel => "schoolLevelId",
            Self::Module => "moduleType",
            Self::AcademicYear => "academicYearId",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            Self::Tenant => "x-tenant-id",
            Self::SchoolLevel => "x-school-level-id",
            Self::Module => "x-module-type",
            Self::AcademicYear => "x-academic-year-id",
        }
    }

    /// Query and body keys accepted for this field, in lookup order.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Self::Tenant => &["tenantId", "tenant_id"],
            Self::SchoolLevel => &["schoolLevelId", "school_level_id"],
            Self::Module => &["moduleType", "module_type", "module"],
            Self::AcademicYear => &["academicYearId", "academic_year_id"],
        }
    }
}

/// Scope values set on the request by an upstream layer, for instance a
/// resolver that maps a school's subdomain to its tenant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmbientScope {
    pub tenant_id: Option<TenantId>,
    pub school_level_id: Option<SchoolLevelId>,
    pub module_type: Option<ModuleType>,
    pub academic_year_id: Option<AcademicYearId>,
}

/// Everything the extractor may read from one request.
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub resolved: Option<&'a RequestContext>,
    pub ambient: Option<&'a AmbientScope>,
    pub headers: &'a HeaderMap,
    pub query: &'a HashMap<String, String>,
    pub body: Option<&'a Value>,
}

/// Where a value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Resolved,
    Ambient,
    Header,
    Query,
    Body,
}

type Lookup = fn(&RequestView<'_>, ContextField) -> Option<String>;

const SOURCES: [(Source, Lookup); 5] = [
    (Source::Resolved, from_resolved),
    (Source::Ambient, from_ambient),
    (Source::Header, from_header),
    (Source::Query, from_query),
    (Source::Body, from_body),
];

/// Raw, unvalidated values for the four scope fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContext {
    pub tenant_id: Option<String>,
    pub school_level_id: Option<String>,
    pub module_type: Option<String>,
    pub academic_year_id: Option<String>,
}

impl ExtractedContext {
    pub fn get(&self, field: ContextField) -> Option<&str> {
        match field {
            ContextField::Tenant => self.tenant_id.as_deref(),
            ContextField::SchoolLevel => self.school_level_id.as_deref(),
            ContextField::Module => self.module_type.as_deref(),
            ContextField::AcademicYear => self.academic_year_id.as_deref(),
        }
    }

    fn set(&mut self, field: ContextField, value: String) {
        let slot = match field {
            ContextField::Tenant => &mut self.tenant_id,
            ContextField::SchoolLevel => &mut self.school_level_id,
            ContextField::Module => &mut self.module_type,
            ContextField::AcademicYear => &mut self.academic_year_id,
        };
        *slot = Some(value);
    }
}

pub fn extract(view: &RequestView<'_>) -> ExtractedContext {
    let mut extracted = ExtractedContext::default();
    for field in ContextField::ALL {
        if let Some((source, value)) = resolve_field(view, field) {
            trace!(field = field.name(), ?source, "Context field resolved");
            extracted.set(field, value);
        }
    }
    extracted
}

/// The first non-empty value for `field`, with the source it came from.
pub fn resolve_field(view: &RequestView<'_>, field: ContextField) -> Option<(Source, String)> {
    SOURCES.iter().find_map(|(source, lookup)| {
        lookup(view, field)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(|v| (*source, v))
    })
}

fn from_resolved(view: &RequestView<'_>, field: ContextField) -> Option<String> {
    let ctx = view.resolved?;
    match field {
        ContextField::Tenant => Some(ctx.tenant_id().to_string()),
        ContextField::SchoolLevel => Some(ctx.school_level_id().to_string()),
        ContextField::Module => ctx.module_type().map(|m| m.to_string()),
        ContextField::AcademicYear => ctx.academic_year_id().map(|y| y.to_string()),
    }
}

fn from_ambient(view: &RequestView<'_>, field: ContextField) -> Option<String> {
    let ambient = view.ambient?;
    match field {
        ContextField::Tenant => ambient.tenant_id.map(|t| t.to_string()),
        ContextField::SchoolLevel => ambient.school_level_id.map(|l| l.to_string()),
        ContextField::Module => ambient.module_type.map(|m| m.to_string()),
        ContextField::AcademicYear => ambient.academic_year_id.map(|y| y.to_string()),
    }
}

fn from_header(view: &RequestView<'_>, field: ContextField) -> Option<String> {
    view.headers
        .get(field.header())
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn from_query(view: &RequestView<'_>, field: ContextField) -> Option<String> {
    field
        .keys()
        .iter()
        .filter_map(|key| view.query.get(*key))
        .find(|v| !v.trim().is_empty())
        .cloned()
}

fn from_body(view: &RequestView<'_>, field: ContextField) -> Option<String> {
    let object = view.body?.as_object()?;
    field
        .keys()
        .iter()
        .filter_map(|key| object.get(*key))
        .filter_map(scalar)
        .find(|v| !v.trim().is_empty())
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn view<'a>(
        headers: &'a HeaderMap,
        query: &'a HashMap<String, String>,
        body: Option<&'a Value>,
    ) -> RequestView<'a> {
        RequestView {
            resolved: None,
            ambient: None,
            headers,
            query,
            body,
        }
    }

    #[test]
    fn test_header_beats_query_and_body() {
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant-id", HeaderValue::from_static("from-header"));
        let query = HashMap::from([("tenantId".to_string(), "from-query".to_string())]);
        let body = json!({ "tenantId": "from-body" });

        let extracted = extract(&view(&headers, &query, Some(&body)));
        assert_eq!(extracted.tenant_id.as_deref(), Some("from-header"));
    }

    #[test]
    fn test_query_beats_body() {
        let headers = HeaderMap::new();
        let query = HashMap::from([("school_level_id".to_string(), "from-query".to_string())]);
        let body = json!({ "schoolLevelId": "from-body" });

        let extracted = extract(&view(&headers, &query, Some(&body)));
        assert_eq!(extracted.school_level_id.as_deref(), Some("from-query"));
    }

    #[test]
    fn test_empty_values_fall_through() {
        let mut headers = HeaderMap::new();
        headers.insert("x-module-type", HeaderValue::from_static("   "));
        let query = HashMap::from([("moduleType".to_string(), String::new())]);
        let body = json!({ "module": "FINANCES" });

        let (source, value) =
            resolve_field(&view(&headers, &query, Some(&body)), ContextField::Module).unwrap();
        assert_eq!(source, Source::Body);
        assert_eq!(value, "FINANCES");
    }

    #[test]
    fn test_resolved_context_wins_over_everything() {
        let tenant = TenantId::new();
        let resolved = RequestContext::new(tenant, SchoolLevelId::new());
        let ambient = AmbientScope {
            tenant_id: Some(TenantId::new()),
            ..Default::default()
        };
        let mut headers = HeaderMap::new();
        headers.insert("x-tenant-id", HeaderValue::from_static("other"));
        let query = HashMap::new();

        let view = RequestView {
            resolved: Some(&resolved),
            ambient: Some(&ambient),
            headers: &headers,
            query: &query,
            body: None,
        };
        let (source, value) = resolve_field(&view, ContextField::Tenant).unwrap();
        assert_eq!(source, Source::Resolved);
        assert_eq!(value, tenant.to_string());
    }

    #[test]
    fn test_resolved_context_without_module_falls_through() {
        let resolved = RequestContext::new(TenantId::new(), SchoolLevelId::new());
        let ambient = AmbientScope {
            module_type: Some(ModuleType::Examens),
            ..Default::default()
        };
        let headers = HeaderMap::new();
        let query = HashMap::new();

        let view = RequestView {
            resolved: Some(&resolved),
            ambient: Some(&ambient),
            headers: &headers,
            query: &query,
            body: None,
        };
        let (source, value) = resolve_field(&view, ContextField::Module).unwrap();
        assert_eq!(source, Source::Ambient);
        assert_eq!(value, "EXAMENS");
    }

    #[test]
    fn test_missing_everywhere_is_none() {
        let headers = HeaderMap::new();
        let query = HashMap::new();
        let body = json!([{ "tenantId": "in-array" }]);

        let extracted = extract(&view(&headers, &query, Some(&body)));
        assert_eq!(extracted, ExtractedContext::default());
    }
}

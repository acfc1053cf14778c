//! Per-route authorization metadata.
//!
//! Every guarded route must be declared in the [`RouteTable`]. A matched
//! route without an entry is refused, so forgetting a declaration can never
//! open a route up.

use std::collections::HashMap;

use axum::http::Method;

use scolaguard_models::ModuleType;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMeta {
    pub public: bool,
    pub required_module: Option<ModuleType>,
    pub required_roles: Vec<String>,
    pub required_permissions: Vec<String>,
}

impl RouteMeta {
    /// No principal, context or permission required.
    pub fn public() -> Self {
        Self {
            public: true,
            ..Default::default()
        }
    }

    /// Requires a principal and a resolved tenant and school level.
    pub fn scoped() -> Self {
        Self::default()
    }

    /// The route belongs to `module`: the request must name a module and
    /// `module` must be enabled for the school level.
    pub fn module(mut self, module: ModuleType) -> Self {
        self.required_module = Some(module);
        self
    }

    pub fn roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_permissions = permissions.into_iter().map(Into::into).collect();
        self
    }
}

/// Route metadata keyed by method and path template (`/api/modules/{module_type}`).
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<(Method, String), RouteMeta>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, method: Method, path: &str, meta: RouteMeta) -> Self {
        self.routes.insert((method, path.to_string()), meta);
        self
    }

    /// Merges `other` into `self`; entries of `other` replace existing ones.
    pub fn merge(mut self, other: RouteTable) -> Self {
        self.routes.extend(other.routes);
        self
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<&RouteMeta> {
        self.routes.get(&(method.clone(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

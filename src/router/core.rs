//! Router core module - hot path for request routing.
//!
//! Routes are stored per HTTP method in registration order. Matching scans the
//! routes of the requested method and the first pattern that matches wins;
//! there is no specificity ranking. When nothing matches under the requested
//! method the other methods are scanned to tell a 405 apart from a 404.

use super::pattern::{normalize_path, split_segments, PathPattern};
use crate::handler::Handler;
use crate::params::ParamSpec;
use crate::validator::CompiledSchema;
use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` shared with the compiled pattern; values are
/// per-request text captured from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// A registered route. Immutable once registered; owned by the [`Router`].
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    /// Resolved parameter specs, in the handler's declared order
    pub params: Vec<ParamSpec>,
    pub handler: Handler,
    /// Compiled return schema, when the handler declares one
    pub output: Option<Arc<dyn CompiledSchema>>,
    /// Name used in logs: the handler's name or `"METHOD pattern"`
    pub name: Arc<str>,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern.as_str())
            .field("name", &self.name)
            .field("params", &self.params)
            .field("output", &self.output.as_ref().map(|s| s.schema_name().to_string()))
            .finish()
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub route: Arc<Route>,
    /// Path parameters extracted from the URL (e.g., `{id}` → `{"id": "123"}`)
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to HashMap
    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Outcome of a route table lookup.
#[derive(Debug)]
pub enum RouteLookup {
    Matched(RouteMatch),
    /// The path matches under other methods only (listed in registration order)
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

/// Route table keyed by HTTP method.
///
/// Mutated only through `&mut self` during registration; once the owning
/// dispatcher is shared the table is read-only and needs no locking.
#[derive(Debug, Default)]
pub struct Router {
    routes: HashMap<Method, Vec<Arc<Route>>>,
    /// Methods in the order their first route was registered
    methods: Vec<Method>,
}

impl Router {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a route after its specs have been resolved.
    pub(crate) fn insert(&mut self, route: Route) -> Arc<Route> {
        let route = Arc::new(route);
        if !self.routes.contains_key(&route.method) {
            self.methods.push(route.method.clone());
        }
        self.routes
            .entry(route.method.clone())
            .or_default()
            .push(Arc::clone(&route));

        info!(
            method = %route.method,
            route_pattern = %route.pattern,
            handler_name = %route.name,
            param_count = route.params.len(),
            routes_count = self.len(),
            "Route registered"
        );
        route
    }

    /// Number of registered routes across all methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All routes, grouped by method in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<Route>> + '_ {
        self.methods
            .iter()
            .filter_map(|m| self.routes.get(m))
            .flat_map(|routes| routes.iter())
    }

    /// One `"METHOD /pattern -> name"` line per route.
    #[must_use]
    pub fn route_summaries(&self) -> Vec<String> {
        self.routes()
            .map(|r| format!("{} {} -> {}", r.method, r.pattern, r.name))
            .collect()
    }

    /// Match an HTTP request to a route
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `path` - Request path (e.g., `/users/123`); a `?query` suffix is ignored
    ///
    /// # Returns
    ///
    /// * `RouteLookup::Matched` - first registered route whose pattern matches
    /// * `RouteLookup::MethodNotAllowed` - the path matches under other methods only
    /// * `RouteLookup::NotFound` - no pattern matches the path under any method
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> RouteLookup {
        debug!(method = %method, path = %path, "Route match attempt");
        let match_start = std::time::Instant::now();

        let path = normalize_path(path.split('?').next().unwrap_or("/"));
        let segments = split_segments(path);

        if let Some(routes) = self.routes.get(method) {
            for route in routes {
                if let Some(path_params) = route.pattern.match_segments(&segments) {
                    debug!(
                        method = %method,
                        path = %path,
                        handler_name = %route.name,
                        route_pattern = %route.pattern,
                        path_params = ?path_params,
                        duration_us = match_start.elapsed().as_micros(),
                        "Route matched"
                    );
                    return RouteLookup::Matched(RouteMatch {
                        route: Arc::clone(route),
                        path_params,
                    });
                }
            }
        }

        let allowed: Vec<Method> = self
            .methods
            .iter()
            .filter(|m| *m != method)
            .filter(|m| {
                self.routes.get(*m).is_some_and(|routes| {
                    routes
                        .iter()
                        .any(|r| r.pattern.match_segments(&segments).is_some())
                })
            })
            .cloned()
            .collect();

        if allowed.is_empty() {
            warn!(
                method = %method,
                path = %path,
                duration_us = match_start.elapsed().as_micros(),
                "No route matched"
            );
            RouteLookup::NotFound
        } else {
            warn!(
                method = %method,
                path = %path,
                allowed = ?allowed,
                "Path matched under other methods only"
            );
            RouteLookup::MethodNotAllowed(allowed)
        }
    }
}

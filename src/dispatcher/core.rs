//! Dispatcher core module - registration and the per-request pipeline.
//!
//! Registration (`&mut self`) compiles the pattern, resolves parameter specs
//! and compiles schemas. Once the dispatcher is shared behind an `Arc` only
//! [`Dispatcher::dispatch`] runs, and it never mutates shared state.

use crate::config::ServiceConfig;
use crate::error::{DispatchError, RegistrationError};
use crate::handler::{Handler, HandlerError, Reply};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::middleware::Middleware;
use crate::params::{bind, resolve_params, Args};
use crate::router::{PathPattern, Route, RouteLookup, RouteMatch, Router};
use crate::server::{Request, Response};
use crate::validator::{JsonSchemaValidator, SchemaValidator};
use futures::FutureExt;
use http::Method;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};

/// Methods routes may be registered for.
pub const SUPPORTED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

impl From<HandlerError> for DispatchError {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Http(e) => DispatchError::Http(e),
            HandlerError::Args(e) => DispatchError::Unhandled(anyhow::Error::new(e)),
            HandlerError::Other(e) => DispatchError::Unhandled(e),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Route table, schema validator and middleware chain.
pub struct Dispatcher {
    router: Router,
    validator: Arc<dyn SchemaValidator>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("middleware_count", &self.middlewares.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Empty dispatcher using [`JsonSchemaValidator`] with caching enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::with_validator(Arc::new(JsonSchemaValidator::default()))
    }

    /// Empty dispatcher using a custom schema validator.
    #[must_use]
    pub fn with_validator(validator: Arc<dyn SchemaValidator>) -> Self {
        Self {
            router: Router::new(),
            validator,
            middlewares: Vec::new(),
        }
    }

    /// Empty dispatcher configured from `config` (schema cache switch).
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::with_validator(Arc::new(JsonSchemaValidator::new(
            config.validation.schema_cache,
        )))
    }

    /// Add middleware to the processing pipeline
    ///
    /// Middleware is executed in the order it's added.
    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Register `handler` for `method` and `pattern`.
    ///
    /// Parameter classification and schema compilation happen here, once.
    ///
    /// # Errors
    ///
    /// A [`RegistrationError`] when the method is unsupported, the pattern is
    /// malformed, or the handler's declarations cannot be bound to the pattern.
    /// Nothing is registered on error.
    pub fn register(
        &mut self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<Arc<Route>, RegistrationError> {
        let route = self
            .build_route(method, pattern, handler)
            .inspect_err(|e| error!(route_pattern = %pattern, error = %e, "Route registration failed"))?;
        Ok(self.router.insert(route))
    }

    fn build_route(
        &self,
        method: Method,
        pattern: &str,
        handler: Handler,
    ) -> Result<Route, RegistrationError> {
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(RegistrationError::UnsupportedMethod { method });
        }

        let pattern = PathPattern::parse(pattern)?;
        let params = resolve_params(
            &method,
            &pattern,
            handler.declared_params(),
            self.validator.as_ref(),
        )?;

        let output = match handler.return_schema() {
            Some(schema) => Some(self.validator.compile(schema).map_err(|reason| {
                RegistrationError::UnresolvedSchema {
                    method: method.clone(),
                    pattern: pattern.to_string(),
                    name: "return".to_string(),
                    schema: schema.name().to_string(),
                    reason,
                }
            })?),
            None => None,
        };

        let name: Arc<str> = match handler.name() {
            Some(name) => Arc::from(name),
            None => Arc::from(format!("{method} {pattern}")),
        };

        Ok(Route {
            method,
            pattern,
            params,
            handler,
            output,
            name,
        })
    }

    pub fn get(&mut self, pattern: &str, handler: Handler) -> Result<Arc<Route>, RegistrationError> {
        self.register(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: Handler) -> Result<Arc<Route>, RegistrationError> {
        self.register(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: Handler) -> Result<Arc<Route>, RegistrationError> {
        self.register(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: Handler) -> Result<Arc<Route>, RegistrationError> {
        self.register(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: Handler) -> Result<Arc<Route>, RegistrationError> {
        self.register(Method::DELETE, pattern, handler)
    }

    /// Run one request through the pipeline.
    ///
    /// Never fails: every error is mapped to a response. The response always
    /// carries an `x-request-id` header.
    pub async fn dispatch(&self, request: Request) -> Response {
        let request_id = RequestId::for_request(&request);
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.path(),
        );
        self.dispatch_inner(Arc::new(request), request_id)
            .instrument(span)
            .await
    }

    async fn dispatch_inner(&self, request: Arc<Request>, request_id: RequestId) -> Response {
        let start = Instant::now();

        let mut early: Option<Response> = None;
        for (idx, mw) in self.middlewares.iter().enumerate() {
            let resp = mw.before(&request);
            if early.is_none() && resp.is_some() {
                debug!(
                    middleware_idx = idx,
                    middleware_name = std::any::type_name_of_val(mw.as_ref()),
                    "Middleware returned early response"
                );
                early = resp;
            }
        }

        let mut response = match early {
            Some(resp) => resp,
            None => match self.process(&request).await {
                Ok(resp) => resp,
                Err(err) => {
                    self.report(&request, &err);
                    err.to_response()
                }
            },
        };

        if response.header(REQUEST_ID_HEADER).is_none() {
            response.set_header(REQUEST_ID_HEADER, request_id.to_string());
        }

        let latency = start.elapsed();
        for mw in &self.middlewares {
            mw.after(&request, &mut response, latency);
        }
        response
    }

    /// match → bind → invoke → map
    async fn process(&self, request: &Arc<Request>) -> Result<Response, DispatchError> {
        let RouteMatch { route, path_params } =
            match self.router.route(request.method(), request.path()) {
                RouteLookup::Matched(m) => m,
                RouteLookup::MethodNotAllowed(allowed) => {
                    return Err(DispatchError::MethodNotAllowed {
                        method: request.method().clone(),
                        path: request.path().to_string(),
                        allowed,
                    })
                }
                RouteLookup::NotFound => {
                    return Err(DispatchError::RouteNotFound {
                        method: request.method().clone(),
                        path: request.path().to_string(),
                    })
                }
            };

        let args = bind(&route.params, request, &path_params).map_err(DispatchError::Binding)?;

        let start = Instant::now();
        let reply = Self::invoke(&route, args).await;
        debug!(
            handler_name = %route.name,
            is_async = route.handler.is_async(),
            execution_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
            ok = reply.is_ok(),
            "Handler execution complete"
        );

        Self::map_reply(&route, reply?)
    }

    /// Await the handler task, turning panics into errors.
    async fn invoke(route: &Route, args: Args) -> Result<Reply, DispatchError> {
        match AssertUnwindSafe(route.handler.invoke(args))
            .catch_unwind()
            .await
        {
            Ok(result) => result.map_err(DispatchError::from),
            Err(panic) => Err(DispatchError::Panicked(panic_message(panic.as_ref()))),
        }
    }

    fn map_reply(route: &Route, reply: Reply) -> Result<Response, DispatchError> {
        match reply {
            Reply::Response(resp) => Ok(resp),
            Reply::Value(value) => {
                let body = match &route.output {
                    Some(schema) => schema.validate(&value).map_err(|errors| {
                        DispatchError::OutputValidation {
                            route: route.name.to_string(),
                            errors,
                        }
                    })?,
                    None => value,
                };
                Ok(Response::json(200, &body))
            }
        }
    }

    /// Log `err` by category and hand it to middleware.
    fn report(&self, request: &Request, err: &DispatchError) {
        match err {
            DispatchError::RouteNotFound { .. } | DispatchError::MethodNotAllowed { .. } => {
                // already logged by the router
            }
            DispatchError::Binding(errors) => {
                info!(error_count = errors.len(), "Request rejected: binding failed");
            }
            DispatchError::Http(e) => {
                info!(status = e.status(), message = %e.message(), "Handler raised HTTP error");
            }
            DispatchError::OutputValidation { route, errors } => {
                error!(handler_name = %route, errors = ?errors, "Handler output failed schema validation");
            }
            DispatchError::Unhandled(e) => {
                error!(error = %format!("{e:#}"), "Unhandled handler error");
            }
            DispatchError::Panicked(message) => {
                let backtrace = std::backtrace::Backtrace::capture();
                error!(
                    panic_message = %message,
                    backtrace = %backtrace,
                    "Handler panicked - CRITICAL"
                );
            }
        }
        for mw in &self.middlewares {
            mw.on_error(request, err);
        }
    }
}

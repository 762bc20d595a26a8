//! Error taxonomy for registration and request processing.
//!
//! Registration errors are returned from [`Dispatcher::register`] and are meant to
//! abort startup. Request errors ([`DispatchError`]) never escape the pipeline:
//! [`DispatchError::to_response`] turns each one into a well-formed JSON response.
//!
//! | error | status | body |
//! |---|---|---|
//! | `RouteNotFound` | 404 | `{"status", "message"}` |
//! | `MethodNotAllowed` | 405 | `{"status", "message"}` + `Allow` header |
//! | `Binding` | 422 | `{"status", "errors": [{"field", "message"}]}` |
//! | `Http` | as raised | `{"status", "message"}` |
//! | `OutputValidation`, `Unhandled`, `Panicked` | 500 | generic message |
//!
//! [`Dispatcher::register`]: crate::dispatcher::Dispatcher::register

use crate::server::Response;
use http::Method;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::warn;

/// Message sent to clients for every server-side failure. Details go to the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// One offending input field: where it is and what is wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// An error a handler raises on purpose, with an explicit status and message.
///
/// The message is sent to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status} {message}")]
pub struct HttpError {
    status: u16,
    message: String,
}

impl HttpError {
    /// Build an HTTP error. Unknown status codes are replaced by a 500.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        let known = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .is_some();
        if !known {
            warn!(status = status, "HttpError raised with an unknown status code");
            return Self {
                status: 500,
                message: format!("invalid HTTP status code {status}"),
            };
        }
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(409, message)
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Startup-time failures raised while registering a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("method {method} is not supported")]
    UnsupportedMethod { method: Method },

    #[error("invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("placeholder '{{{name}}}' appears more than once in '{pattern}'")]
    DuplicatePlaceholder { pattern: String, name: String },

    #[error("{method} {pattern}: parameter '{name}' is declared more than once")]
    DuplicateParameter {
        method: Method,
        pattern: String,
        name: String,
    },

    #[error("{method} {pattern}: only one body parameter is allowed, found '{first}' and '{second}'")]
    MultipleBodies {
        method: Method,
        pattern: String,
        first: String,
        second: String,
    },

    #[error("{method} {pattern}: schema '{schema}' for '{name}' could not be resolved: {reason}")]
    UnresolvedSchema {
        method: Method,
        pattern: String,
        name: String,
        schema: String,
        reason: String,
    },

    #[error("{method} {pattern}: path parameter '{name}' must be int, float, str or bool")]
    PathParameterNotPrimitive {
        method: Method,
        pattern: String,
        name: String,
    },

    #[error("{method} {pattern}: placeholder '{{{name}}}' has no matching path parameter")]
    UnboundPlaceholder {
        method: Method,
        pattern: String,
        name: String,
    },

    #[error("{method} {pattern}: default {value} for '{name}' is not a valid {expected}")]
    InvalidDefault {
        method: Method,
        pattern: String,
        name: String,
        value: String,
        expected: String,
    },
}

/// Request-time failures. All of them are recovered at the pipeline boundary.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no route matches {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("{method} is not allowed for {path}")]
    MethodNotAllowed {
        method: Method,
        path: String,
        allowed: Vec<Method>,
    },

    #[error("request binding failed with {} problem(s)", .0.len())]
    Binding(Vec<FieldError>),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("response of {route} does not match its declared schema")]
    OutputValidation {
        route: String,
        errors: Vec<FieldError>,
    },

    #[error("unhandled handler error: {0:#}")]
    Unhandled(anyhow::Error),

    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl DispatchError {
    /// HTTP status this error maps to.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::RouteNotFound { .. } => 404,
            DispatchError::MethodNotAllowed { .. } => 405,
            DispatchError::Binding(_) => 422,
            DispatchError::Http(e) => e.status(),
            DispatchError::OutputValidation { .. }
            | DispatchError::Unhandled(_)
            | DispatchError::Panicked(_) => 500,
        }
    }

    /// `true` for failures caused by the server rather than the client.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status() >= 500
    }

    /// Map this error to the response sent to the client.
    #[must_use]
    pub fn to_response(&self) -> Response {
        let status = self.status();
        match self {
            DispatchError::RouteNotFound { .. } => {
                Response::json(status, &json!({ "status": status, "message": "Not Found" }))
            }
            DispatchError::MethodNotAllowed { allowed, .. } => {
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                Response::json(
                    status,
                    &json!({ "status": status, "message": "Method Not Allowed" }),
                )
                .with_header("allow", allow)
            }
            DispatchError::Binding(errors) => {
                Response::json(status, &json!({ "status": status, "errors": errors }))
            }
            DispatchError::Http(e) => {
                Response::json(status, &json!({ "status": status, "message": e.message() }))
            }
            DispatchError::OutputValidation { .. }
            | DispatchError::Unhandled(_)
            | DispatchError::Panicked(_) => Response::json(
                status,
                &json!({ "status": status, "message": INTERNAL_ERROR_MESSAGE }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_is_verbatim() {
        let err = DispatchError::from(HttpError::unauthorized("unauthorized"));
        let res = err.to_response();
        assert_eq!(res.status(), 401);
        assert_eq!(
            res.body_json(),
            Some(json!({"status": 401, "message": "unauthorized"}))
        );
    }

    #[test]
    fn test_unknown_status_becomes_500() {
        let err = HttpError::new(799, "nope");
        assert_eq!(err.status(), 500);
        assert_eq!(err.message(), "invalid HTTP status code 799");
    }

    #[test]
    fn test_binding_errors_list_fields() {
        let err = DispatchError::Binding(vec![
            FieldError::new("id", "expected int, got \"abc\""),
            FieldError::new("limit", "missing required query parameter"),
        ]);
        let res = err.to_response();
        assert_eq!(res.status(), 422);
        let body = res.body_json().unwrap();
        assert_eq!(body["status"], 422);
        assert_eq!(body["errors"][0]["field"], "id");
        assert_eq!(body["errors"][1]["message"], "missing required query parameter");
    }

    #[test]
    fn test_server_errors_do_not_leak_detail() {
        let err = DispatchError::Unhandled(anyhow::anyhow!("db password is hunter2"));
        let res = err.to_response();
        assert_eq!(res.status(), 500);
        let text = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let err = DispatchError::MethodNotAllowed {
            method: Method::DELETE,
            path: "/items".to_string(),
            allowed: vec![Method::GET, Method::POST],
        };
        let res = err.to_response();
        assert_eq!(res.status(), 405);
        assert_eq!(res.header("allow"), Some("GET, POST"));
    }
}

use std::time::Duration;

use tracing::{info, warn};

use super::Middleware;
use crate::error::DispatchError;
use crate::ids::REQUEST_ID_HEADER;
use crate::server::{Request, Response};

/// Emits one structured event per request start and completion.
///
/// The dispatcher already runs each request inside a `request` span; this
/// middleware adds the access-log style events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &Request) -> Option<Response> {
        info!(
            method = %req.method(),
            path = %req.path(),
            query_count = req.query().len(),
            header_count = req.headers().len(),
            body_bytes = req.body().len(),
            "Request started"
        );
        None
    }

    fn after(&self, req: &Request, res: &mut Response, latency: Duration) {
        info!(
            method = %req.method(),
            path = %req.path(),
            status = res.status(),
            request_id = res.header(REQUEST_ID_HEADER).unwrap_or_default(),
            latency_us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX),
            "Request completed"
        );
    }

    fn on_error(&self, req: &Request, err: &DispatchError) {
        if !err.is_server_error() {
            warn!(
                method = %req.method(),
                path = %req.path(),
                status = err.status(),
                error = %err,
                "Request rejected"
            );
        }
    }
}

use std::time::Duration;

use crate::error::DispatchError;
use crate::server::{Request, Response};

/// Hooks run around every dispatched request, in registration order.
pub trait Middleware: Send + Sync {
    /// Runs before routing. Returning a response skips the rest of the pipeline.
    fn before(&self, _req: &Request) -> Option<Response> {
        None
    }

    /// Runs on every response, including early and error responses.
    fn after(&self, _req: &Request, _res: &mut Response, _latency: Duration) {}

    /// Observes a pipeline error before it is mapped to a response.
    fn on_error(&self, _req: &Request, _err: &DispatchError) {}
}

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::error::DispatchError;
use crate::server::{Request, Response};

/// In-process request counters.
///
/// All counters are atomics updated with `Ordering::Relaxed`; readings are
/// eventually consistent and never block a request.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    client_errors: AtomicUsize,
    server_errors: AtomicUsize,
    binding_failures: AtomicUsize,
    unmatched: AtomicUsize,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen by `before`.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean latency over all completed requests, zero before the first one.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses with a 4xx status.
    #[must_use]
    pub fn client_errors(&self) -> usize {
        self.client_errors.load(Ordering::Relaxed)
    }

    /// Responses with a 5xx status.
    #[must_use]
    pub fn server_errors(&self) -> usize {
        self.server_errors.load(Ordering::Relaxed)
    }

    /// Requests rejected with 422.
    #[must_use]
    pub fn binding_failures(&self) -> usize {
        self.binding_failures.load(Ordering::Relaxed)
    }

    /// Requests answered 404 or 405.
    #[must_use]
    pub fn unmatched(&self) -> usize {
        self.unmatched.load(Ordering::Relaxed)
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _req: &Request) -> Option<Response> {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn after(&self, _req: &Request, res: &mut Response, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
        match res.status() {
            400..=499 => {
                self.client_errors.fetch_add(1, Ordering::Relaxed);
            }
            500..=599 => {
                self.server_errors.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn on_error(&self, _req: &Request, err: &DispatchError) {
        match err {
            DispatchError::Binding(_) => {
                self.binding_failures.fetch_add(1, Ordering::Relaxed);
            }
            DispatchError::RouteNotFound { .. } | DispatchError::MethodNotAllowed { .. } => {
                self.unmatched.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }
}

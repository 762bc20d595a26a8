//! # Middleware Module
//!
//! Middleware observes, and may short-circuit, every request the dispatcher
//! handles. Hooks run in registration order:
//!
//! - `before` runs ahead of routing; the first `Some(response)` wins and the
//!   route is never invoked
//! - `on_error` sees each pipeline error before it becomes a response
//! - `after` sees every outgoing response together with the request latency

mod core;
mod metrics;
mod tracing;

pub use core::Middleware;
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;

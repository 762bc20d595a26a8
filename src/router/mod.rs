//! # Router Module
//!
//! The router module stores registered routes and matches incoming requests
//! against them.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling path patterns such as `/pets/{id}` into literal and placeholder segments
//! - Keeping registered routes per HTTP method, in registration order
//! - Matching a `(method, path)` pair to a route and capturing placeholder text
//! - Telling "no such path" (404) apart from "path exists under other methods" (405)
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::dispatcher::Dispatcher;
//! use brrtdispatch::handler::Handler;
//! use brrtdispatch::params::{Param, ParamType};
//! use brrtdispatch::router::RouteLookup;
//! use http::Method;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .get(
//!         "/pets/{id}",
//!         Handler::sync(|args| Ok(args.int("id")?)).param(Param::new("id", ParamType::Int)),
//!     )
//!     .expect("valid route");
//!
//! match dispatcher.router().route(&Method::GET, "/pets/123") {
//!     RouteLookup::Matched(m) => assert_eq!(m.get_path_param("id"), Some("123")),
//!     other => panic!("unexpected lookup result: {other:?}"),
//! }
//! ```
//!
//! ## Performance
//!
//! Matching is a linear scan over the routes of one method, comparing
//! pre-split segments. Captured parameters live in a `SmallVec` so the common
//! case does not allocate for the parameter list itself.

mod core;
mod pattern;
#[cfg(test)]
mod tests;

pub use core::{ParamVec, Route, RouteLookup, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use pattern::{PathPattern, Segment};

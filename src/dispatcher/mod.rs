//! # Dispatcher Module
//!
//! The dispatcher owns the route table and runs the request pipeline.
//!
//! ## Overview
//!
//! Two phases, strictly ordered:
//!
//! 1. **Registration** - `register` (or `get`/`post`/`put`/`patch`/`delete`)
//!    compiles the pattern, classifies the handler's parameters and compiles
//!    any schemas. Errors abort registration.
//! 2. **Dispatch** - `dispatch` takes a [`Request`](crate::server::Request)
//!    through middleware, route matching, parameter binding, handler
//!    invocation and response mapping.
//!
//! ## Request Flow
//!
//! 1. Middleware `before` hooks (may answer early)
//! 2. Route lookup: 404 when no pattern matches, 405 when only other methods do
//! 3. Binding: all parameter problems are collected into one 422
//! 4. Invocation: sync and async handlers are awaited the same way; panics
//!    are caught and become 500
//! 5. Mapping: a returned `Response` is emitted as-is; any other value is
//!    checked against the declared return schema (mismatch → 500) and
//!    serialized as a 200 JSON body
//! 6. Middleware `after` hooks
//!
//! ## Error Handling
//!
//! Every error is converted by [`DispatchError::to_response`](crate::error::DispatchError::to_response).
//! Server-side failures are logged with full detail and answered with a
//! generic message.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::dispatcher::Dispatcher;
//! use brrtdispatch::handler::Handler;
//! use brrtdispatch::params::{Param, ParamType};
//! use brrtdispatch::server::Request;
//! use http::Method;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .get(
//!         "/items/{id}",
//!         Handler::sync(|args| Ok(serde_json::json!({ "id": args.int("id")? })))
//!             .param(Param::new("id", ParamType::Int)),
//!     )
//!     .expect("valid route");
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! let res = rt.block_on(dispatcher.dispatch(Request::builder(Method::GET, "/items/42").build()));
//! assert_eq!(res.status(), 200);
//! assert_eq!(res.body_json(), Some(serde_json::json!({ "id": 42 })));
//! ```

mod core;

pub use core::{Dispatcher, SUPPORTED_METHODS};

//! # brrtdispatch
//!
//! **brrtdispatch** is a small request-dispatch engine: it matches incoming
//! requests against registered path patterns, binds declared handler
//! parameters from the path, query string, headers, cookies and JSON body,
//! invokes synchronous or asynchronous handlers the same way, and maps
//! results and failures onto HTTP responses.
//!
//! ## Architecture
//!
//! - **[`router`]** - `{name}` path patterns and the per-method route table
//! - **[`params`]** - parameter declarations, registration-time classification and per-request binding
//! - **[`validator`]** - JSON Schema compilation and validation of bodies and handler output
//! - **[`handler`]** - the uniform handler abstraction over sync and async callables
//! - **[`dispatcher`]** - registration and the request pipeline
//! - **[`error`]** - HTTP errors raised by handlers and the error → response mapping
//! - **[`middleware`]** - before/after/error hooks (tracing, metrics)
//! - **[`server`]** - request/response model and the HTTP/1.1 transport adapter
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - service plumbing
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(axum adapter)
//!     participant Dispatcher
//!     participant Router
//!     participant Binder as params::bind
//!     participant Handler
//!
//!     Client->>Server: GET /items/42?verbose=yes
//!     Server->>Dispatcher: dispatch(Request)
//!     Dispatcher->>Dispatcher: middleware before hooks
//!     Dispatcher->>Router: route(GET, "/items/42")
//!     alt no pattern matches
//!         Router-->>Client: 404
//!     else pattern matches another method only
//!         Router-->>Client: 405 + Allow
//!     end
//!     Router-->>Dispatcher: RouteMatch {id: "42"}
//!     Dispatcher->>Binder: bind(params, request)
//!     alt conversion or validation errors
//!         Binder-->>Client: 422 {"status":422,"errors":[...]}
//!     end
//!     Dispatcher->>Handler: invoke(Args)
//!     alt HttpError
//!         Handler-->>Client: status + {"status","message"}
//!     else other failure or panic
//!         Handler-->>Client: 500 (detail logged only)
//!     end
//!     Handler-->>Dispatcher: Reply
//!     Dispatcher->>Dispatcher: output validation, middleware after hooks
//!     Dispatcher-->>Client: Response
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use brrtdispatch::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.get(
//!     "/get/{id}",
//!     Handler::sync(|args| {
//!         Ok(serde_json::json!({ "name": args.str("name")?, "id": args.int("id")? }))
//!     })
//!     .param(Param::new("id", ParamType::Int))
//!     .param(Param::new("name", ParamType::Str).with_default("guest")),
//! )?;
//!
//! let config = ServiceConfig::load(None)?;
//! brrtdispatch::server::serve(Arc::new(dispatcher), &config.http).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Runtime Considerations
//!
//! The route table is built with `&mut Dispatcher` and then shared read-only
//! behind an `Arc`. [`cli::run_cli`] serves from a single current-thread event
//! loop; requests interleave only where an asynchronous handler awaits.
//! Synchronous handlers run inline on the loop, so long blocking work belongs
//! in an asynchronous handler using `spawn_blocking`. Handler tasks are
//! `Send + 'static`, so embedding the dispatcher in a multi-threaded runtime
//! also works.

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod params;
pub mod router;
pub mod server;
pub mod validator;

pub use config::ServiceConfig;
pub use dispatcher::Dispatcher;
pub use error::{DispatchError, FieldError, HttpError, RegistrationError};
pub use handler::{Handler, HandlerError, IntoReply, Json, Reply};
pub use params::{Args, Marker, Param, ParamType};
pub use server::{Request, Response};
pub use validator::Schema;

/// Everything a service needs to declare and register handlers.
pub mod prelude {
    pub use crate::config::ServiceConfig;
    pub use crate::dispatcher::Dispatcher;
    pub use crate::error::HttpError;
    pub use crate::handler::{Handler, HandlerError, Json, Reply};
    pub use crate::params::{Args, Marker, Param, ParamType};
    pub use crate::server::{Cookie, Request, Response};
    pub use crate::validator::Schema;
    pub use http::Method;
}

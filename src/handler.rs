//! # Handler Module
//!
//! A [`Handler`] pairs a callable with its declared parameter list and an
//! optional return schema. Synchronous and asynchronous callables are wrapped
//! into the same task shape, a boxed future yielding `Result<Reply, HandlerError>`,
//! so the dispatcher awaits every handler the same way.
//!
//! Construction is lazy: nothing in the callable runs until the task is
//! polled. This keeps panics from either kind of handler inside the
//! dispatcher's unwind guard.
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::handler::{Handler, HandlerError};
//! use brrtdispatch::error::HttpError;
//! use brrtdispatch::params::{Param, ParamType};
//!
//! let sync = Handler::sync(|args| {
//!     let id = args.int("id")?;
//!     if id == 0 {
//!         return Err(HttpError::not_found("no such item").into());
//!     }
//!     Ok(serde_json::json!({ "id": id }))
//! })
//! .param(Param::new("id", ParamType::Int));
//!
//! let asynchronous = Handler::asynchronous(|args| async move {
//!     Ok::<_, HandlerError>(args.int("id")? * 2)
//! })
//! .param(Param::new("id", ParamType::Int));
//! # let _ = (sync, asynchronous);
//! ```

use crate::error::HttpError;
use crate::params::{ArgError, Args, Param};
use crate::server::Response;
use crate::validator::Schema;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Errors a handler may raise.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Sent to the client with its own status and message
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Handler asked for an argument it did not declare, or with the wrong type
    #[error(transparent)]
    Args(#[from] ArgError),

    /// Anything else; reported to the client as a generic 500
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn other<E>(error: E) -> Self
    where
        E: Into<anyhow::Error>,
    {
        HandlerError::Other(error.into())
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(e: serde_json::Error) -> Self {
        HandlerError::Other(e.into())
    }
}

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A complete response, emitted as-is without output validation
    Response(Response),
    /// A value serialized to a 200 JSON response after output validation
    Value(Value),
}

/// Conversion from handler return values into a [`Reply`].
pub trait IntoReply {
    /// # Errors
    ///
    /// Fails when the value cannot be serialized.
    fn into_reply(self) -> Result<Reply, HandlerError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(self)
    }
}

impl IntoReply for Response {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Response(self))
    }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Value(self))
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Value(Value::Null))
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Value(Value::from(self)))
    }
}

macro_rules! into_reply_via_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Result<Reply, HandlerError> {
                    Ok(Reply::Value(Value::from(self)))
                }
            }
        )*
    };
}

into_reply_via_json!(String, bool, i32, i64, u32, u64, f64);

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        match self {
            Some(v) => v.into_reply(),
            None => Ok(Reply::Value(Value::Null)),
        }
    }
}

/// Serializes any `T: Serialize` as a reply value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, HandlerError> {
        Ok(Reply::Value(serde_json::to_value(self.0)?))
    }
}

/// The task every handler call produces.
pub type HandlerFuture = BoxFuture<'static, Result<Reply, HandlerError>>;

type HandlerFn = dyn Fn(Args) -> HandlerFuture + Send + Sync;

/// A callable plus the declarations the dispatcher needs to bind and check it.
#[derive(Clone)]
pub struct Handler {
    call: Arc<HandlerFn>,
    params: Vec<Param>,
    returns: Option<Schema>,
    name: Option<Arc<str>>,
    is_async: bool,
}

impl Handler {
    /// Wrap a function that completes immediately.
    pub fn sync<F, R>(f: F) -> Self
    where
        F: Fn(Args) -> Result<R, HandlerError> + Send + Sync + 'static,
        R: IntoReply,
    {
        let f = Arc::new(f);
        let call = move |args: Args| -> HandlerFuture {
            let f = Arc::clone(&f);
            async move { f(args).and_then(IntoReply::into_reply) }.boxed()
        };
        Self::from_fn(Arc::new(call), false)
    }

    /// Wrap a function returning a future.
    pub fn asynchronous<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
        R: IntoReply,
    {
        let f = Arc::new(f);
        let call = move |args: Args| -> HandlerFuture {
            let f = Arc::clone(&f);
            async move { f(args).await.and_then(IntoReply::into_reply) }.boxed()
        };
        Self::from_fn(Arc::new(call), true)
    }

    fn from_fn(call: Arc<HandlerFn>, is_async: bool) -> Self {
        Self {
            call,
            params: Vec::new(),
            returns: None,
            name: None,
            is_async,
        }
    }

    /// Declare the next parameter. Declaration order is argument order.
    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn params<I>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = Param>,
    {
        self.params.extend(params);
        self
    }

    /// Declare the schema plain return values must satisfy.
    #[must_use]
    pub fn returns(mut self, schema: Schema) -> Self {
        self.returns = Some(schema);
        self
    }

    /// Name used in logs instead of `"METHOD pattern"`.
    #[must_use]
    pub fn named(mut self, name: impl AsRef<str>) -> Self {
        self.name = Some(Arc::from(name.as_ref()));
        self
    }

    #[must_use]
    pub fn declared_params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn return_schema(&self) -> Option<&Schema> {
        self.returns.as_ref()
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// Start the handler task. Nothing runs until the returned future is polled.
    #[must_use]
    pub fn invoke(&self, args: Args) -> HandlerFuture {
        (self.call)(args)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns.as_ref().map(Schema::name))
            .field("is_async", &self.is_async)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_sync_and_async_produce_same_reply() {
        let sync = Handler::sync(|_| Ok(json!({"ok": true})));
        let asynchronous = Handler::asynchronous(|_| async { Ok::<_, HandlerError>(json!({"ok": true})) });
        assert!(!sync.is_async());
        assert!(asynchronous.is_async());
        let a = sync.invoke(Args::default()).await.unwrap();
        let b = asynchronous.invoke(Args::default()).await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invoke_is_lazy() {
        let handler = Handler::sync(|_| -> Result<(), HandlerError> { panic!("ran eagerly") });
        drop(handler.invoke(Args::default()));
    }

    #[test]
    fn test_into_reply_conversions() {
        assert_eq!("hi".into_reply().unwrap(), Reply::Value(json!("hi")));
        assert_eq!(().into_reply().unwrap(), Reply::Value(Value::Null));
        assert_eq!(
            Option::<i64>::None.into_reply().unwrap(),
            Reply::Value(Value::Null)
        );
        assert_eq!(3_i64.into_reply().unwrap(), Reply::Value(json!(3)));

        #[derive(Serialize)]
        struct Item {
            id: u32,
        }
        assert_eq!(
            Json(Item { id: 4 }).into_reply().unwrap(),
            Reply::Value(json!({"id": 4}))
        );

        let res = Response::text(201, "created");
        assert_eq!(
            res.clone().into_reply().unwrap(),
            Reply::Response(res)
        );
    }

    #[test]
    fn test_builder_records_declarations() {
        let handler = Handler::sync(|_| Ok(()))
            .param(Param::new("id", crate::params::ParamType::Int))
            .returns(Schema::new("Empty", json!({"type": "null"})))
            .named("noop");
        assert_eq!(handler.declared_params().len(), 1);
        assert_eq!(handler.return_schema().map(Schema::name), Some("Empty"));
        assert_eq!(handler.name(), Some("noop"));
    }
}

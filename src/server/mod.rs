//! Request/response model and the HTTP transport adapter.

pub mod http_server;
pub mod request;
pub mod response;

pub use http_server::{serve, HttpServer, ServerHandle};
pub use request::{parse_cookies, parse_query_params, Request, RequestBuilder};
pub use response::{Cookie, HeaderVec, Response, MAX_INLINE_HEADERS};

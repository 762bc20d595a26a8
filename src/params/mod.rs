//! # Parameters Module
//!
//! Handlers declare their inputs as an ordered list of [`Param`]s. At
//! registration [`resolve_params`] classifies each one into a [`ParamSpec`]
//! with a single [`ParamSource`]; at request time [`bind`] turns the specs
//! plus a matched request into [`Args`].
//!
//! ## Sources
//!
//! | source | value taken from |
//! |---|---|
//! | `RequestObject` | the whole [`Request`](crate::server::Request) |
//! | `Header` | request header named like the parameter (case-insensitive) |
//! | `Cookie` | cookie named like the parameter |
//! | `Path` | text captured by the `{name}` placeholder |
//! | `Body` | JSON body, validated against the parameter's schema |
//! | `Query` | query-string value named like the parameter |
//!
//! Primitive conversion accepts `int`, `float`, `str` and `bool`. Booleans
//! accept `true/false`, `1/0`, `yes/no`, `on/off`, `t/f` and `y/n` in any case.

mod args;
mod bind;
mod resolve;
mod types;

pub use args::{ArgError, Args};
pub use bind::{bind, convert_primitive, parse_bool};
pub use resolve::resolve_params;
pub use types::{ArgValue, Marker, Param, ParamSource, ParamSpec, ParamType};

use crate::server::Request;
use crate::validator::{CompiledSchema, Schema};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Declared type of a handler parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    Int,
    Float,
    Str,
    Bool,
    /// Structured value validated through the schema validator
    Schema(Schema),
    /// The request entity itself
    Request,
}

impl ParamType {
    /// `true` for the scalar types that can be read from path, query, header or cookie text.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            ParamType::Int | ParamType::Float | ParamType::Str | ParamType::Bool
        )
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Str => "str",
            ParamType::Bool => "bool",
            ParamType::Schema(schema) => schema.name(),
            ParamType::Request => "request",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Source marker attached to a declared parameter.
///
/// Markers only say where a value comes from; the optional string is the
/// default used when the header or cookie is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    Header(Option<String>),
    Cookie(Option<String>),
}

impl Marker {
    #[must_use]
    pub fn header() -> Self {
        Marker::Header(None)
    }

    #[must_use]
    pub fn header_or(default: impl Into<String>) -> Self {
        Marker::Header(Some(default.into()))
    }

    #[must_use]
    pub fn cookie() -> Self {
        Marker::Cookie(None)
    }

    #[must_use]
    pub fn cookie_or(default: impl Into<String>) -> Self {
        Marker::Cookie(Some(default.into()))
    }
}

/// A bound argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    /// A validated structured body
    Json(Value),
    Request(Arc<Request>),
}

impl ArgValue {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Int(_) => "int",
            ArgValue::Float(_) => "float",
            ArgValue::Str(_) => "str",
            ArgValue::Bool(_) => "bool",
            ArgValue::Json(_) => "json",
            ArgValue::Request(_) => "request",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, ArgValue::Null)
    }

    /// JSON view of the value; a request becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            ArgValue::Null | ArgValue::Request(_) => Value::Null,
            ArgValue::Int(i) => Value::from(*i),
            ArgValue::Float(f) => Value::from(*f),
            ArgValue::Str(s) => Value::from(s.as_str()),
            ArgValue::Bool(b) => Value::from(*b),
            ArgValue::Json(v) => v.clone(),
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Request(req) => write!(f, "<request {} {}>", req.method(), req.path()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        ArgValue::Int(i64::from(v))
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        ArgValue::Bool(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(v: String) -> Self {
        ArgValue::Str(v)
    }
}

impl From<Value> for ArgValue {
    fn from(v: Value) -> Self {
        ArgValue::Json(v)
    }
}

/// A parameter as declared by a handler, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub(crate) name: String,
    pub(crate) ty: ParamType,
    pub(crate) marker: Option<Marker>,
    pub(crate) default: Option<ArgValue>,
}

impl Param {
    /// A parameter whose source is inferred from its name and type.
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            marker: None,
            default: None,
        }
    }

    /// A parameter read from the request header of the same name.
    pub fn header(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ty).with_marker(Marker::header())
    }

    /// A parameter read from the cookie of the same name.
    pub fn cookie(name: impl Into<String>, ty: ParamType) -> Self {
        Self::new(name, ty).with_marker(Marker::cookie())
    }

    /// A structured body parameter validated against `schema`.
    pub fn body(name: impl Into<String>, schema: Schema) -> Self {
        Self::new(name, ParamType::Schema(schema))
    }

    /// A parameter receiving the whole request.
    pub fn request(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Request)
    }

    #[must_use]
    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Value used when the input is absent; makes the parameter optional.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<ArgValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Optional parameter that binds to null when absent.
    #[must_use]
    pub fn optional(self) -> Self {
        self.with_default(ArgValue::Null)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> &ParamType {
        &self.ty
    }
}

/// Where a resolved parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamSource {
    Path,
    Query,
    Header,
    Cookie,
    Body,
    RequestObject,
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamSource::Path => "path",
            ParamSource::Query => "query",
            ParamSource::Header => "header",
            ParamSource::Cookie => "cookie",
            ParamSource::Body => "body",
            ParamSource::RequestObject => "request",
        };
        f.write_str(s)
    }
}

/// A classified parameter: produced once at registration, read on every request.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: Arc<str>,
    pub ty: ParamType,
    pub source: ParamSource,
    pub required: bool,
    pub default: Option<ArgValue>,
    /// Compiled schema for `Body` parameters
    pub(crate) schema: Option<Arc<dyn CompiledSchema>>,
}

impl ParamSpec {
    #[must_use]
    pub fn schema(&self) -> Option<&Arc<dyn CompiledSchema>> {
        self.schema.as_ref()
    }
}

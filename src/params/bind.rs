//! Request-time binding of resolved parameters.
//!
//! Binding never suspends and never fails fast: every spec is processed and
//! all problems are reported together as [`FieldError`]s.

use super::args::Args;
use super::types::{ArgValue, ParamSource, ParamSpec, ParamType};
use crate::error::FieldError;
use crate::router::ParamVec;
use crate::server::Request;
use std::sync::Arc;
use tracing::{debug, info};

const TRUTHY: &[&str] = &["true", "1", "yes", "on", "t", "y"];
const FALSY: &[&str] = &["false", "0", "no", "off", "f", "n"];

/// Parse a boolean token, case-insensitively.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    let token = raw.trim();
    if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(true)
    } else if FALSY.iter().any(|t| t.eq_ignore_ascii_case(token)) {
        Some(false)
    } else {
        None
    }
}

/// Convert raw text to a primitive [`ArgValue`].
///
/// # Errors
///
/// `"expected <type>, got \"<raw>\""` when the text does not convert, or when
/// `ty` is not a primitive type.
pub fn convert_primitive(ty: &ParamType, raw: &str) -> Result<ArgValue, String> {
    let mismatch = || format!("expected {}, got {raw:?}", ty.type_name());
    match ty {
        ParamType::Int => raw.trim().parse::<i64>().map(ArgValue::Int).map_err(|_| mismatch()),
        ParamType::Float => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(ArgValue::Float(v)),
            _ => Err(mismatch()),
        },
        ParamType::Str => Ok(ArgValue::Str(raw.to_string())),
        ParamType::Bool => parse_bool(raw).map(ArgValue::Bool).ok_or_else(mismatch),
        ParamType::Schema(_) | ParamType::Request => Err(mismatch()),
    }
}

/// `item` + `/tags/0` → `item.tags.0`
fn body_field(name: &str, pointer: &str) -> String {
    let mut field = name.to_string();
    for part in pointer.split('/').filter(|p| !p.is_empty()) {
        field.push('.');
        field.push_str(&part.replace("~1", "/").replace("~0", "~"));
    }
    field
}

fn missing_message(source: ParamSource) -> &'static str {
    match source {
        ParamSource::Query => "missing required query parameter",
        ParamSource::Header => "missing required header",
        ParamSource::Cookie => "missing required cookie",
        ParamSource::Path => "missing path parameter",
        ParamSource::Body => "missing request body",
        ParamSource::RequestObject => "missing request",
    }
}

fn bind_one(
    spec: &ParamSpec,
    request: &Arc<Request>,
    path_params: &ParamVec,
    errors: &mut Vec<FieldError>,
) -> Option<ArgValue> {
    let raw = match spec.source {
        ParamSource::RequestObject => return Some(ArgValue::Request(Arc::clone(request))),
        ParamSource::Body => return bind_body(spec, request, errors),
        ParamSource::Path => path_params
            .iter()
            .find(|(k, _)| *k == spec.name)
            .map(|(_, v)| v.as_str()),
        ParamSource::Query => request.query_param(&spec.name),
        ParamSource::Header => request.header(&spec.name),
        ParamSource::Cookie => request.cookie(&spec.name),
    };

    match raw {
        Some(raw) => match convert_primitive(&spec.ty, raw) {
            Ok(value) => Some(value),
            Err(message) => {
                errors.push(FieldError::new(spec.name.as_ref(), message));
                None
            }
        },
        None => absent(spec, errors),
    }
}

fn absent(spec: &ParamSpec, errors: &mut Vec<FieldError>) -> Option<ArgValue> {
    match &spec.default {
        Some(default) if !spec.required => Some(default.clone()),
        _ => {
            errors.push(FieldError::new(
                spec.name.as_ref(),
                missing_message(spec.source),
            ));
            None
        }
    }
}

fn bind_body(
    spec: &ParamSpec,
    request: &Request,
    errors: &mut Vec<FieldError>,
) -> Option<ArgValue> {
    let body = request.body();
    if body.iter().all(u8::is_ascii_whitespace) {
        return absent(spec, errors);
    }

    let raw: serde_json::Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            errors.push(FieldError::new(
                spec.name.as_ref(),
                format!("invalid JSON body: {e}"),
            ));
            return None;
        }
    };

    let Some(schema) = spec.schema() else {
        return Some(ArgValue::Json(raw));
    };

    match schema.validate(&raw) {
        Ok(value) => Some(ArgValue::Json(value)),
        Err(problems) => {
            errors.extend(
                problems
                    .into_iter()
                    .map(|p| FieldError::new(body_field(&spec.name, &p.field), p.message)),
            );
            None
        }
    }
}

/// Bind every spec against one matched request.
///
/// # Errors
///
/// All binding problems of the request, in declared parameter order.
pub fn bind(
    specs: &[ParamSpec],
    request: &Arc<Request>,
    path_params: &ParamVec,
) -> Result<Args, Vec<FieldError>> {
    let mut values = Vec::with_capacity(specs.len());
    let mut errors = Vec::new();

    for spec in specs {
        if let Some(value) = bind_one(spec, request, path_params, &mut errors) {
            values.push((Arc::clone(&spec.name), value));
        }
    }

    if errors.is_empty() {
        debug!(
            method = %request.method(),
            path = %request.path(),
            arg_count = values.len(),
            "Parameters bound"
        );
        Ok(Args::new(values))
    } else {
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        info!(
            method = %request.method(),
            path = %request.path(),
            fields = ?fields,
            error_count = errors.len(),
            "Request binding failed"
        );
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_tokens() {
        for t in ["true", "TRUE", "1", "yes", "On", "t", "Y"] {
            assert_eq!(parse_bool(t), Some(true), "{t}");
        }
        for f in ["false", "0", "NO", "off", "F", "n"] {
            assert_eq!(parse_bool(f), Some(false), "{f}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn test_convert_messages() {
        assert_eq!(
            convert_primitive(&ParamType::Int, "abc").unwrap_err(),
            "expected int, got \"abc\""
        );
        assert_eq!(
            convert_primitive(&ParamType::Float, "1.5").unwrap(),
            ArgValue::Float(1.5)
        );
        assert!(convert_primitive(&ParamType::Float, "NaN").is_err());
        assert_eq!(
            convert_primitive(&ParamType::Str, " padded ").unwrap(),
            ArgValue::Str(" padded ".to_string())
        );
    }

    #[test]
    fn test_body_field_names() {
        assert_eq!(body_field("item", ""), "item");
        assert_eq!(body_field("item", "/tags/0"), "item.tags.0");
        assert_eq!(body_field("item", "/a~1b"), "item.a/b");
    }
}

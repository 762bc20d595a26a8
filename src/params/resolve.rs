//! Registration-time classification of declared parameters.
//!
//! Each declared [`Param`] is classified into exactly one [`ParamSource`],
//! evaluated in this order:
//!
//! 1. request type → `RequestObject`
//! 2. header marker → `Header`
//! 3. cookie marker → `Cookie`
//! 4. name equals a pattern placeholder → `Path`
//! 5. schema type → `Body` (at most one per route)
//! 6. anything else → `Query`
//!
//! Every placeholder must end up bound to exactly one `Path` parameter.

use super::bind::convert_primitive;
use super::types::{ArgValue, Marker, Param, ParamSource, ParamSpec, ParamType};
use crate::error::RegistrationError;
use crate::router::PathPattern;
use crate::validator::SchemaValidator;
use http::Method;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Classify `params` against `pattern`, compiling body schemas with `validator`.
///
/// The returned specs keep the declared order.
///
/// # Errors
///
/// Any [`RegistrationError`] describing why the handler cannot be bound to
/// this route.
pub fn resolve_params(
    method: &Method,
    pattern: &PathPattern,
    params: &[Param],
    validator: &dyn SchemaValidator,
) -> Result<Vec<ParamSpec>, RegistrationError> {
    let mut specs = Vec::with_capacity(params.len());
    let mut seen: HashSet<&str> = HashSet::new();
    let mut body_param: Option<&str> = None;

    for param in params {
        if !seen.insert(param.name()) {
            return Err(RegistrationError::DuplicateParameter {
                method: method.clone(),
                pattern: pattern.to_string(),
                name: param.name().to_string(),
            });
        }

        let spec = classify(method, pattern, param, validator)?;

        if spec.source == ParamSource::Body {
            if let Some(first) = body_param {
                return Err(RegistrationError::MultipleBodies {
                    method: method.clone(),
                    pattern: pattern.to_string(),
                    first: first.to_string(),
                    second: param.name().to_string(),
                });
            }
            body_param = Some(param.name());
        }

        debug!(
            method = %method,
            route_pattern = %pattern,
            param = %spec.name,
            source = %spec.source,
            ty = %spec.ty,
            required = spec.required,
            "Parameter classified"
        );
        specs.push(spec);
    }

    for placeholder in pattern.placeholders() {
        let bound = specs
            .iter()
            .any(|s| s.source == ParamSource::Path && s.name.as_ref() == placeholder);
        if !bound {
            return Err(RegistrationError::UnboundPlaceholder {
                method: method.clone(),
                pattern: pattern.to_string(),
                name: placeholder.to_string(),
            });
        }
    }

    Ok(specs)
}

fn classify(
    method: &Method,
    pattern: &PathPattern,
    param: &Param,
    validator: &dyn SchemaValidator,
) -> Result<ParamSpec, RegistrationError> {
    let invalid_default = |value: String| RegistrationError::InvalidDefault {
        method: method.clone(),
        pattern: pattern.to_string(),
        name: param.name().to_string(),
        value,
        expected: param.ty().type_name().to_string(),
    };

    let (source, marker_default) = if param.ty == ParamType::Request {
        (ParamSource::RequestObject, None)
    } else {
        match &param.marker {
            Some(Marker::Header(default)) => (ParamSource::Header, default.as_deref()),
            Some(Marker::Cookie(default)) => (ParamSource::Cookie, default.as_deref()),
            None if pattern.has_placeholder(param.name()) => (ParamSource::Path, None),
            None if !param.ty.is_primitive() => (ParamSource::Body, None),
            None => (ParamSource::Query, None),
        }
    };

    if source == ParamSource::Path && !param.ty.is_primitive() {
        return Err(RegistrationError::PathParameterNotPrimitive {
            method: method.clone(),
            pattern: pattern.to_string(),
            name: param.name().to_string(),
        });
    }

    // Markers on non-primitive types still read text, which cannot become a schema value.
    if matches!(source, ParamSource::Header | ParamSource::Cookie) && !param.ty.is_primitive() {
        return Err(invalid_default(format!("<{source} marker>")));
    }

    let default = match (source, &param.default, marker_default) {
        (ParamSource::RequestObject | ParamSource::Path, _, _) => None,
        (_, Some(explicit), _) => {
            Some(coerce_default(&param.ty, explicit).ok_or_else(|| invalid_default(explicit.to_string()))?)
        }
        (_, None, Some(raw)) => Some(
            convert_primitive(&param.ty, raw).map_err(|_| invalid_default(format!("{raw:?}")))?,
        ),
        (_, None, None) => None,
    };

    let schema = match (&source, &param.ty) {
        (ParamSource::Body, ParamType::Schema(schema)) => {
            let compiled = validator.compile(schema).map_err(|reason| {
                RegistrationError::UnresolvedSchema {
                    method: method.clone(),
                    pattern: pattern.to_string(),
                    name: param.name().to_string(),
                    schema: schema.name().to_string(),
                    reason,
                }
            })?;
            Some(compiled)
        }
        _ => None,
    };

    let required = match source {
        ParamSource::Path => true,
        ParamSource::RequestObject => false,
        _ => default.is_none(),
    };

    Ok(ParamSpec {
        name: Arc::from(param.name()),
        ty: param.ty.clone(),
        source,
        required,
        default,
        schema,
    })
}

/// Check an explicit default against the declared type. Integers widen to float.
fn coerce_default(ty: &ParamType, value: &ArgValue) -> Option<ArgValue> {
    match (ty, value) {
        (_, ArgValue::Null) => Some(ArgValue::Null),
        (ParamType::Int, ArgValue::Int(_))
        | (ParamType::Float, ArgValue::Float(_))
        | (ParamType::Str, ArgValue::Str(_))
        | (ParamType::Bool, ArgValue::Bool(_))
        | (ParamType::Schema(_), ArgValue::Json(_)) => Some(value.clone()),
        #[allow(clippy::cast_precision_loss)]
        (ParamType::Float, ArgValue::Int(i)) => Some(ArgValue::Float(*i as f64)),
        _ => None,
    }
}

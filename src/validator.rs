//! # Schema Validator Module
//!
//! Structured bodies and handler return values are checked against named
//! schemas through the [`SchemaValidator`] collaborator. Schemas are compiled
//! once when a route is registered; the request path only runs the compiled
//! form and never takes a lock.
//!
//! The default implementation, [`JsonSchemaValidator`], compiles JSON Schema
//! documents with the `jsonschema` crate and keeps compiled validators in a
//! name-keyed cache so several routes sharing a schema compile it once. The
//! cache can be disabled with `BRRTD_SCHEMA_CACHE=off` (see
//! [`crate::config`]).
//!
//! ## Example
//!
//! ```rust
//! use brrtdispatch::validator::{JsonSchemaValidator, Schema, SchemaValidator};
//! use serde_json::json;
//!
//! let validator = JsonSchemaValidator::default();
//! let schema = Schema::new("Item", json!({
//!     "type": "object",
//!     "required": ["name"],
//!     "properties": {"name": {"type": "string"}}
//! }));
//! let compiled = validator.compile(&schema).unwrap();
//! assert!(compiled.validate(&json!({"name": "widget"})).is_ok());
//! assert!(compiled.validate(&json!({"name": 5})).is_err());
//! ```

use crate::error::FieldError;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info};

/// A named schema document.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: Arc<str>,
    document: Value,
}

impl Schema {
    pub fn new(name: impl AsRef<str>, document: Value) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            document,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }
}

/// Compiles schemas at registration time.
pub trait SchemaValidator: Send + Sync {
    /// Compile `schema` into a reusable validator.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the schema cannot be resolved.
    fn compile(&self, schema: &Schema) -> Result<Arc<dyn CompiledSchema>, String>;
}

/// A compiled schema, shared by every request that uses it.
pub trait CompiledSchema: Send + Sync + fmt::Debug {
    fn schema_name(&self) -> &str;

    /// Validate `raw`, returning the value to hand to the handler.
    ///
    /// # Errors
    ///
    /// One [`FieldError`] per violation. `field` holds the JSON pointer of the
    /// offending location (empty for the document root).
    fn validate(&self, raw: &Value) -> Result<Value, Vec<FieldError>>;
}

/// JSON Schema backed validator with a name-keyed compile cache.
pub struct JsonSchemaValidator {
    cache: RwLock<HashMap<Arc<str>, (Value, Arc<CompiledJsonSchema>)>>,
    cache_enabled: bool,
}

impl JsonSchemaValidator {
    pub fn new(cache_enabled: bool) -> Self {
        info!(
            enabled = cache_enabled,
            "Initializing JSON Schema validator cache"
        );
        Self {
            cache: RwLock::new(HashMap::new()),
            cache_enabled,
        }
    }

    /// Number of compiled schemas held in the cache.
    #[must_use]
    pub fn cached_count(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn compile_uncached(schema: &Schema) -> Result<Arc<CompiledJsonSchema>, String> {
        match JSONSchema::compile(schema.document()) {
            Ok(compiled) => Ok(Arc::new(CompiledJsonSchema {
                name: Arc::clone(&schema.name),
                compiled,
            })),
            Err(e) => {
                error!(
                    schema_name = %schema.name(),
                    error = %e,
                    "Failed to compile JSON Schema"
                );
                Err(e.to_string())
            }
        }
    }
}

impl Default for JsonSchemaValidator {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator")
            .field("cache_enabled", &self.cache_enabled)
            .field("cached_count", &self.cached_count())
            .finish()
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn compile(&self, schema: &Schema) -> Result<Arc<dyn CompiledSchema>, String> {
        if !self.cache_enabled {
            return Self::compile_uncached(schema).map(|c| c as Arc<dyn CompiledSchema>);
        }

        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((document, compiled)) = cache.get(schema.name()) {
                if document != schema.document() {
                    return Err(format!(
                        "schema name '{}' is already registered with a different document",
                        schema.name()
                    ));
                }
                debug!(schema_name = %schema.name(), "Schema validator cache hit");
                return Ok(Arc::clone(compiled) as Arc<dyn CompiledSchema>);
            }
        }

        let compiled = Self::compile_uncached(schema)?;
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let entry = cache
            .entry(Arc::clone(&schema.name))
            .or_insert_with(|| (schema.document().clone(), Arc::clone(&compiled)));
        if entry.0 != *schema.document() {
            return Err(format!(
                "schema name '{}' is already registered with a different document",
                schema.name()
            ));
        }
        let cached = Arc::clone(&entry.1);
        info!(
            schema_name = %schema.name(),
            cache_size = cache.len(),
            "Schema validator compiled and cached"
        );
        Ok(cached as Arc<dyn CompiledSchema>)
    }
}

/// A `jsonschema` validator tagged with its schema name.
pub struct CompiledJsonSchema {
    name: Arc<str>,
    compiled: JSONSchema,
}

impl fmt::Debug for CompiledJsonSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledJsonSchema")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CompiledSchema for CompiledJsonSchema {
    fn schema_name(&self) -> &str {
        &self.name
    }

    fn validate(&self, raw: &Value) -> Result<Value, Vec<FieldError>> {
        match self.compiled.validate(raw) {
            Ok(()) => Ok(raw.clone()),
            Err(errors) => Err(errors
                .map(|e| FieldError::new(e.instance_path.to_string(), e.to_string()))
                .collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_schema() -> Schema {
        Schema::new(
            "Item",
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": {"type": "string"},
                    "price": {"type": "number", "minimum": 0}
                }
            }),
        )
    }

    #[test]
    fn test_valid_document_passes_through() {
        let v = JsonSchemaValidator::default();
        let compiled = v.compile(&item_schema()).unwrap();
        let raw = json!({"name": "widget", "price": 2.5});
        assert_eq!(compiled.validate(&raw).unwrap(), raw);
        assert_eq!(compiled.schema_name(), "Item");
    }

    #[test]
    fn test_errors_carry_json_pointer() {
        let v = JsonSchemaValidator::default();
        let compiled = v.compile(&item_schema()).unwrap();
        let errors = compiled
            .validate(&json!({"name": "widget", "price": -1}))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "/price");
    }

    #[test]
    fn test_missing_required_reports_root() {
        let v = JsonSchemaValidator::default();
        let compiled = v.compile(&item_schema()).unwrap();
        let errors = compiled.validate(&json!({})).unwrap_err();
        assert_eq!(errors[0].field, "");
        assert!(errors[0].message.contains("name"));
    }

    #[test]
    fn test_cache_compiles_once_per_name() {
        let v = JsonSchemaValidator::new(true);
        v.compile(&item_schema()).unwrap();
        v.compile(&item_schema()).unwrap();
        assert_eq!(v.cached_count(), 1);
    }

    #[test]
    fn test_conflicting_documents_are_rejected() {
        let v = JsonSchemaValidator::new(true);
        v.compile(&item_schema()).unwrap();
        let other = Schema::new("Item", json!({"type": "string"}));
        let err = v.compile(&other).unwrap_err();
        assert!(err.contains("different document"));
    }

    #[test]
    fn test_disabled_cache_stores_nothing() {
        let v = JsonSchemaValidator::new(false);
        v.compile(&item_schema()).unwrap();
        assert_eq!(v.cached_count(), 0);
    }

    #[test]
    fn test_invalid_schema_fails_to_compile() {
        let v = JsonSchemaValidator::default();
        let bad = Schema::new("Bad", json!({"type": 12}));
        assert!(v.compile(&bad).is_err());
    }
}

use super::types::ArgValue;
use crate::server::Request;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Misuse of [`Args`] inside a handler. These are handler defects, not client errors.
#[derive(Debug, Error)]
pub enum ArgError {
    #[error("argument '{0}' is not declared")]
    Missing(String),

    #[error("argument '{name}' is {found}, not {expected}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("argument '{name}' does not deserialize: {source}")]
    Deserialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Bound handler arguments, in declared order.
#[derive(Debug, Clone, Default)]
pub struct Args {
    values: Vec<(Arc<str>, ArgValue)>,
}

macro_rules! typed_accessor {
    ($name:ident, $opt:ident, $variant:ident, $ty:ty, $label:literal) => {
        #[doc = concat!("The `", $label, "` argument `name`.")]
        ///
        /// # Errors
        ///
        /// [`ArgError`] when the argument is undeclared or has another type.
        pub fn $name(&self, name: &str) -> Result<$ty, ArgError> {
            match self.value(name)? {
                ArgValue::$variant(v) => Ok(*v),
                other => Err(Self::wrong_type(name, $label, other)),
            }
        }

        #[doc = concat!("Like [`Args::", stringify!($name), "`], mapping an absent optional argument to `None`.")]
        ///
        /// # Errors
        ///
        /// [`ArgError`] when the argument is undeclared or has another type.
        pub fn $opt(&self, name: &str) -> Result<Option<$ty>, ArgError> {
            match self.value(name)? {
                ArgValue::Null => Ok(None),
                ArgValue::$variant(v) => Ok(Some(*v)),
                other => Err(Self::wrong_type(name, $label, other)),
            }
        }
    };
}

impl Args {
    pub(crate) fn new(values: Vec<(Arc<str>, ArgValue)>) -> Self {
        Self { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v)
    }

    /// Positional access in declared order.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> + '_ {
        self.values.iter().map(|(k, v)| (k.as_ref(), v))
    }

    fn value(&self, name: &str) -> Result<&ArgValue, ArgError> {
        self.get(name)
            .ok_or_else(|| ArgError::Missing(name.to_string()))
    }

    fn wrong_type(name: &str, expected: &'static str, found: &ArgValue) -> ArgError {
        ArgError::WrongType {
            name: name.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    typed_accessor!(int, opt_int, Int, i64, "int");
    typed_accessor!(float, opt_float, Float, f64, "float");
    typed_accessor!(bool, opt_bool, Bool, bool, "bool");

    /// # Errors
    ///
    /// [`ArgError`] when the argument is undeclared or not a string.
    pub fn str(&self, name: &str) -> Result<&str, ArgError> {
        match self.value(name)? {
            ArgValue::Str(s) => Ok(s.as_str()),
            other => Err(Self::wrong_type(name, "str", other)),
        }
    }

    /// # Errors
    ///
    /// [`ArgError`] when the argument is undeclared or neither a string nor null.
    pub fn opt_str(&self, name: &str) -> Result<Option<&str>, ArgError> {
        match self.value(name)? {
            ArgValue::Null => Ok(None),
            ArgValue::Str(s) => Ok(Some(s.as_str())),
            other => Err(Self::wrong_type(name, "str", other)),
        }
    }

    /// Validated body as raw JSON.
    ///
    /// # Errors
    ///
    /// [`ArgError`] when the argument is undeclared or not a body.
    pub fn json(&self, name: &str) -> Result<&Value, ArgError> {
        match self.value(name)? {
            ArgValue::Json(v) => Ok(v),
            other => Err(Self::wrong_type(name, "json", other)),
        }
    }

    /// Validated body deserialized into `T`.
    ///
    /// # Errors
    ///
    /// [`ArgError`] when the argument is not a body or `T` does not deserialize from it.
    pub fn body<T: DeserializeOwned>(&self, name: &str) -> Result<T, ArgError> {
        let value = self.json(name)?;
        T::deserialize(value).map_err(|source| ArgError::Deserialize {
            name: name.to_string(),
            source,
        })
    }

    /// # Errors
    ///
    /// [`ArgError`] when the argument is undeclared or not the request.
    pub fn request(&self, name: &str) -> Result<Arc<Request>, ArgError> {
        match self.value(name)? {
            ArgValue::Request(r) => Ok(Arc::clone(r)),
            other => Err(Self::wrong_type(name, "request", other)),
        }
    }
}

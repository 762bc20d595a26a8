//! # Service Configuration Module
//!
//! Services load a YAML file (conventionally `config/config.yaml`) into a
//! [`ServiceConfig`]; every field has a default so an empty file is valid.
//! Environment variables prefixed `BRRTD_` override the file.
//!
//! ## Environment Variables
//!
//! | variable | field | example |
//! |---|---|---|
//! | `BRRTD_BIND` | `http.bind` | `0.0.0.0:8080` |
//! | `BRRTD_MAX_BODY_BYTES` | `http.max_body_bytes` | `1048576` |
//! | `BRRTD_LOG_LEVEL` | `logging.level` | `debug` |
//! | `BRRTD_LOG_FORMAT` | `logging.format` | `pretty` |
//! | `BRRTD_LOG_TARGET_FILTER` | `logging.target_filter` | `brrtdispatch::router=warn` |
//! | `BRRTD_SCHEMA_CACHE` | `validation.schema_cache` | `off` |
//!
//! ## Example
//!
//! ```yaml
//! http:
//!   bind: 0.0.0.0:8080
//!   max_body_bytes: 65536
//! logging:
//!   level: debug
//!   format: pretty
//! validation:
//!   schema_cache: true
//! ```

use crate::logging::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Socket address the transport binds to
    pub bind: String,
    /// Request bodies above this size are answered with 413
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Share compiled schemas between routes using the same schema name
    pub schema_cache: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { schema_cache: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub http: HttpConfig,
    pub logging: LogConfig,
    pub validation: ValidationConfig,
}

/// `on/off`-style switch used by `BRRTD_SCHEMA_CACHE`.
fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" | "enabled" => Some(true),
        "off" | "false" | "0" | "no" | "disabled" => Some(false),
        _ => None,
    }
}

impl ServiceConfig {
    /// Parse YAML text. An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed YAML or unknown value types.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Read and parse a YAML file, without environment overrides.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Load the file when given (defaults otherwise), then apply `BRRTD_*` overrides.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from reading, parsing or an invalid override.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        debug!(config = ?config, "Service configuration loaded");
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] when a numeric or switch value does not parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(bind) = lookup("BRRTD_BIND") {
            self.http.bind = bind;
        }
        if let Some(raw) = lookup("BRRTD_MAX_BODY_BYTES") {
            self.http.max_body_bytes =
                raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::InvalidEnv {
                        key: "BRRTD_MAX_BODY_BYTES",
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?;
        }
        if let Some(level) = lookup("BRRTD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("BRRTD_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format);
        }
        if let Some(filter) = lookup("BRRTD_LOG_TARGET_FILTER") {
            self.logging.target_filter = Some(filter);
        }
        if let Some(raw) = lookup("BRRTD_SCHEMA_CACHE") {
            self.validation.schema_cache =
                parse_switch(&raw).ok_or_else(|| ConfigError::InvalidEnv {
                    key: "BRRTD_SCHEMA_CACHE",
                    value: raw.clone(),
                    reason: "expected on or off".to_string(),
                })?;
        }
        Ok(())
    }
}

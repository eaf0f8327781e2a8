//! Exposure configuration

use serde::{Deserialize, Serialize};

use crate::naming::{SchemaIdentifier, default_schema_identifier, short_schema_identifier};

/// Configuration for schema reflection and endpoint mounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposeConfig {
    /// Prefix prepended to every endpoint path (e.g. `/rpc`)
    #[serde(default)]
    pub path_prefix: String,

    /// Path the openapi document is served at
    #[serde(default = "default_spec_path")]
    pub spec_path: String,

    /// How schema identifiers are derived from types
    #[serde(default)]
    pub identifiers: IdentifierStrategy,

    /// Promote nested schemas into `components.schemas`
    #[serde(default = "default_true")]
    pub extract_sub_schemas: bool,

    /// Default request validation for endpoints that don't set their own
    #[serde(default)]
    pub validate_requests: bool,

    /// Initial log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Built-in identifier strategies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierStrategy {
    /// Full module path, see [`default_schema_identifier`]
    #[default]
    Default,
    /// Last module segment, see [`short_schema_identifier`]
    Short,
}

impl IdentifierStrategy {
    pub fn identifier(self) -> SchemaIdentifier {
        match self {
            IdentifierStrategy::Default => default_schema_identifier(),
            IdentifierStrategy::Short => short_schema_identifier(),
        }
    }
}

fn default_spec_path() -> String {
    "/swagger.json".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ExposeConfig {
    fn default() -> Self {
        Self {
            path_prefix: String::new(),
            spec_path: default_spec_path(),
            identifiers: IdentifierStrategy::default(),
            extract_sub_schemas: true,
            validate_requests: false,
            log_level: default_log_level(),
        }
    }
}

impl ExposeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Join `path` onto the configured prefix
    pub fn mount(&self, path: &str) -> String {
        let prefix = self.path_prefix.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{prefix}/{path}")
    }
}

#[cfg(test)]
#[path = "config/config_tests.rs"]
mod config_tests;

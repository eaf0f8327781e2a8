//! Call context passed to every exposed function

use std::collections::BTreeMap;

/// Context for an incoming call
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Unique request ID assigned by the host
    pub request_id: u64,
    /// Path of the endpoint being called
    pub path: String,
    /// Optional correlation ID for tracking across systems
    pub correlation_id: Option<String>,
    /// Request metadata forwarded by the host (headers, peer info, ...)
    pub metadata: BTreeMap<String, String>,
}

impl Context {
    /// Create a new call context
    pub fn new(request_id: u64, path: impl Into<String>) -> Self {
        Self {
            request_id,
            path: path.into(),
            correlation_id: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

//! Payload codecs and the content type registry

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use expose_core::ExposeError;
use serde_json::Value;
use thiserror::Error;

/// MIME type of the JSON codec
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CodecError::Deserialization(err.to_string())
        } else {
            CodecError::Serialization(err.to_string())
        }
    }
}

impl From<CodecError> for ExposeError {
    fn from(err: CodecError) -> Self {
        ExposeError::Serialization(err.to_string())
    }
}

/// Converts payload bytes to and from JSON values
pub trait Codec: Send + Sync {
    /// Encode a value to bytes
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes to a value
    fn decode(&self, data: &[u8]) -> Result<Value, CodecError>;

    /// Get the content type for this codec
    fn content_type(&self) -> &'static str;
}

/// JSON codec implementation using serde_json
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    /// Whether to pretty-print output (default: false for efficiency)
    pretty: bool,
}

impl JsonCodec {
    /// Create a new JSON codec
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Create a JSON codec that pretty-prints output
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Encode a value directly to a JSON string
    pub fn encode_string(&self, value: &Value) -> Result<String, CodecError> {
        if self.pretty {
            serde_json::to_string_pretty(value).map_err(Into::into)
        } else {
            serde_json::to_string(value).map_err(Into::into)
        }
    }
}

impl Codec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        if self.pretty {
            serde_json::to_vec_pretty(value).map_err(Into::into)
        } else {
            serde_json::to_vec(value).map_err(Into::into)
        }
    }

    fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(data).map_err(Into::into)
    }

    fn content_type(&self) -> &'static str {
        JSON_CONTENT_TYPE
    }
}

/// Codecs keyed by MIME type
///
/// The default registry maps `application/json` and `*/*` to [`JsonCodec`].
#[derive(Clone)]
pub struct Codecs {
    by_type: BTreeMap<String, Arc<dyn Codec>>,
}

impl Default for Codecs {
    fn default() -> Self {
        let json: Arc<dyn Codec> = Arc::new(JsonCodec::new());
        let mut by_type = BTreeMap::new();
        by_type.insert(JSON_CONTENT_TYPE.to_string(), Arc::clone(&json));
        by_type.insert("*/*".to_string(), json);
        Self { by_type }
    }
}

impl Codecs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a codec under its own content type, replacing any previous one
    pub fn register(&mut self, codec: impl Codec + 'static) {
        let content_type = codec.content_type().to_string();
        self.by_type.insert(content_type, Arc::new(codec));
    }

    /// Register a codec under an additional MIME type
    pub fn register_as(&mut self, mime_type: impl Into<String>, codec: Arc<dyn Codec>) {
        self.by_type.insert(mime_type.into(), codec);
    }

    pub fn get(&self, mime_type: &str) -> Option<&Arc<dyn Codec>> {
        self.by_type.get(mime_type)
    }

    /// Codec for a `Content-Type`/`Accept` value
    ///
    /// Media type parameters are ignored. A missing value selects JSON.
    pub fn select(&self, mime_type: Option<&str>) -> Result<&Arc<dyn Codec>, ExposeError> {
        let essence = mime_type
            .and_then(|value| value.split(';').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(JSON_CONTENT_TYPE);

        self.get(essence)
            .ok_or_else(|| ExposeError::Codec(format!("content type '{essence}' is not supported")))
    }

    pub fn mime_types(&self) -> impl Iterator<Item = &str> {
        self.by_type.keys().map(String::as_str)
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.by_type.keys()).finish()
    }
}

//! Request dispatch for exposed functions
//!
//! The [`Handler`] owns the functions, the assembled OpenAPI document and the codecs. The host
//! transport hands it a path and raw payload bytes; the handler routes, decodes, invokes and
//! encodes.

use std::collections::BTreeMap;
use std::sync::Arc;

use expose_core::{
    ExposeConfig, ExposeError, ExposeResult, ReflectSettings, SchemaRef, SchemaTable,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codec::{Codec, Codecs, JsonCodec};
use crate::context::Context;
use crate::document::{OpenApi, Server, reflect_spec};
use crate::function::Function;

/// Options for building a [`Handler`]
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    config: ExposeConfig,
    reflect: Option<ReflectSettings>,
    template: OpenApi,
    codecs: Codecs,
}

impl HandlerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: ExposeConfig) -> Self {
        self.config = config;
        self
    }

    /// Reflection settings; derived from the config when not set
    pub fn with_reflect_settings(mut self, settings: ReflectSettings) -> Self {
        self.reflect = Some(settings);
        self
    }

    /// Template document for info, servers and additional schemas
    pub fn with_template(mut self, template: OpenApi) -> Self {
        self.template = template;
        self
    }

    pub fn with_codecs(mut self, codecs: Codecs) -> Self {
        self.codecs = codecs;
        self
    }

    /// Register an additional codec under its content type
    pub fn with_codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codecs.register(codec);
        self
    }
}

/// Encoded result of a call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// `None` for functions without a result
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Reply {
    fn empty() -> Self {
        Self {
            content_type: None,
            body: Vec::new(),
        }
    }
}

/// Error payload sent to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorBody {
    /// HTTP status matching an error
    ///
    /// Errors carrying an application code are `422`, undecodable requests `400`.
    pub fn status(err: &ExposeError) -> u16 {
        match err {
            ExposeError::UnknownEndpoint(_) => 404,
            ExposeError::Codec(_) => 415,
            ExposeError::Serialization(_) => 400,
            ExposeError::Handler(_) if err.code().is_some() => 422,
            _ => 500,
        }
    }
}

impl From<&ExposeError> for ErrorBody {
    fn from(err: &ExposeError) -> Self {
        Self {
            message: err.to_string(),
            code: err.code().map(str::to_string),
        }
    }
}

/// Routes calls to exposed functions
pub struct Handler {
    config: ExposeConfig,
    functions: BTreeMap<String, Function>,
    spec: OpenApi,
    validation_spec: OpenApi,
    codecs: Codecs,
}

impl Handler {
    /// Build the handler and its OpenAPI document
    ///
    /// Fails on duplicate paths and on types that cannot be reflected.
    pub fn new(functions: Vec<Function>, options: HandlerOptions) -> ExposeResult<Self> {
        let HandlerOptions {
            config,
            reflect,
            mut template,
            codecs,
        } = options;
        let settings = reflect.unwrap_or_else(|| ReflectSettings::from_config(&config));

        if !config.path_prefix.is_empty() && template.servers.is_empty() {
            template.servers.push(Server {
                url: config.path_prefix.clone(),
                description: None,
            });
        }

        let validation_settings = settings.clone().skip_extract_sub_schemas(true);
        let validation_spec = reflect_spec(template.clone(), &functions, &validation_settings)?;
        let spec = reflect_spec(template, &functions, &settings)?;

        let mut by_path = BTreeMap::new();
        for function in functions {
            let validate = function.settings().validate || config.validate_requests;
            let function = function.validate(validate);
            info!(
                path = %config.mount(function.path()),
                operation = %function.operation_id(),
                "exposed function"
            );
            let path = function.path().to_string();
            if by_path.insert(path.clone(), function).is_some() {
                return Err(ExposeError::DuplicatePath(path));
            }
        }

        Ok(Self {
            config,
            functions: by_path,
            spec,
            validation_spec,
            codecs,
        })
    }

    /// Shareable handle
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn config(&self) -> &ExposeConfig {
        &self.config
    }

    /// The OpenAPI document with sub schemas extracted into components
    pub fn spec(&self) -> &OpenApi {
        &self.spec
    }

    /// Path the document is served at, including the prefix
    pub fn spec_path(&self) -> String {
        self.config.mount(&self.config.spec_path)
    }

    /// The OpenAPI document as JSON
    pub fn spec_json(&self) -> ExposeResult<Vec<u8>> {
        JsonCodec::new()
            .encode(&serde_json::to_value(&self.spec)?)
            .map_err(Into::into)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    /// Function mounted at `path`; the configured prefix is stripped first
    pub fn route(&self, path: &str) -> Option<&Function> {
        let prefix = self.config.path_prefix.trim_end_matches('/');
        let path = match path.strip_prefix(prefix) {
            Some(rest) if !prefix.is_empty() && rest.starts_with('/') => rest,
            _ => path,
        };
        self.functions.get(path)
    }

    /// Request schema of the function at `path`, with nested schemas inline
    ///
    /// Recursive types stay references; they resolve against [`Handler::validation_schemas`].
    /// `None` for unknown paths and nullary functions.
    pub fn request_schema(&self, path: &str) -> Option<&SchemaRef> {
        let function = self.route(path)?;
        let schema = self.validation_spec.request_schema(function.path())?;
        self.validation_spec.resolve(schema)
    }

    /// Schema table backing [`Handler::request_schema`]
    pub fn validation_schemas(&self) -> &SchemaTable {
        &self.validation_spec.components.schemas
    }

    /// Whether requests to `path` should be validated before the call
    pub fn should_validate(&self, path: &str) -> bool {
        self.route(path)
            .is_some_and(|function| function.settings().validate)
    }

    /// Dispatch a call
    ///
    /// The request is decoded with the codec selected by `content_type` and the reply encoded
    /// with the one selected by `accept`, falling back to `content_type`. Nullary functions
    /// ignore the body.
    pub async fn call(
        &self,
        path: &str,
        ctx: Context,
        content_type: Option<&str>,
        accept: Option<&str>,
        body: &[u8],
    ) -> ExposeResult<Reply> {
        let Some(function) = self.route(path) else {
            warn!(path, "no function mounted");
            return Err(ExposeError::UnknownEndpoint(path.to_string()));
        };

        let request = if function.is_nullary() {
            Value::Null
        } else {
            let codec = self.codecs.select(content_type).inspect_err(|err| {
                warn!(path, error = %err, "rejected request");
            })?;
            codec.decode(body).map_err(|err| {
                warn!(path, error = %err, "undecodable request");
                ExposeError::from(err)
            })?
        };

        debug!(path, request_id = ctx.request_id, "calling function");
        let response = function.call(ctx, request).await?;

        if function.is_void() {
            return Ok(Reply::empty());
        }

        let codec = self.codecs.select(accept.or(content_type))?;
        Ok(Reply {
            content_type: Some(codec.content_type().to_string()),
            body: codec.encode(&response)?,
        })
    }

    /// Encode `err` for the caller
    pub fn error_reply(&self, err: &ExposeError, accept: Option<&str>) -> Reply {
        let value = serde_json::to_value(ErrorBody::from(err)).unwrap_or(Value::Null);
        let codec = match self.codecs.select(accept) {
            Ok(codec) => Arc::clone(codec),
            Err(_) => Arc::new(JsonCodec::new()),
        };
        match codec.encode(&value) {
            Ok(body) => Reply {
                content_type: Some(codec.content_type().to_string()),
                body,
            },
            Err(_) => Reply {
                content_type: Some("text/plain".to_string()),
                body: err.to_string().into_bytes(),
            },
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("config", &self.config)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

//! Error types for schema reflection and endpoint exposure

use thiserror::Error;

/// Result type alias for reflection and exposure operations
pub type ExposeResult<T> = Result<T, ExposeError>;

/// Boxed error returned by exposed functions and custom steps
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for reflection, discovery and invocation
#[derive(Error, Debug)]
pub enum ExposeError {
    /// The type cannot be reflected (channels, function handles, ...)
    #[error("unsupported type {type_name}: {reason}")]
    UnsupportedType { type_name: String, reason: String },

    /// A customizer step failed while building a schema node
    #[error("customizer failed for {type_name}{}: {source}", field_label(.field))]
    Customizer {
        type_name: String,
        field: String,
        source: Box<ExposeError>,
    },

    /// The schema tree walk failed; `context` locates the failing node
    #[error("{context}: {source}")]
    Extraction {
        context: String,
        source: Box<ExposeError>,
    },

    /// Reflecting the schema of a type failed
    #[error("failed to reflect schema {type_name}; {source}")]
    Reflect {
        type_name: String,
        source: Box<ExposeError>,
    },

    /// Assembling the openapi document failed
    #[error("failed to reflect openapi spec: {0}")]
    Spec(Box<ExposeError>),

    /// Two endpoints resolved to the same path
    #[error("duplicate endpoint path: {0}")]
    DuplicatePath(String),

    /// No endpoint is registered at the requested path
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    /// No codec is registered for the requested content type
    #[error("codec error: {0}")]
    Codec(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An exposed function returned an error
    #[error("{0}")]
    Handler(BoxError),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),

    /// Error raised by caller supplied code (mappers, customizers, providers)
    #[error(transparent)]
    Other(BoxError),
}

fn field_label(field: &str) -> String {
    if field.is_empty() {
        String::new()
    } else {
        format!(" (field {field})")
    }
}

impl ExposeError {
    /// Wrap an arbitrary error raised by caller supplied code
    pub fn other(err: impl Into<BoxError>) -> Self {
        ExposeError::Other(err.into())
    }

    /// Wrap an error returned by an exposed function
    pub fn handler(err: impl Into<BoxError>) -> Self {
        ExposeError::Handler(err.into())
    }

    /// Prefix this error with the position of the schema node that failed
    pub fn in_context(self, context: impl Into<String>) -> Self {
        ExposeError::Extraction {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Application code attached to a handler error via [`with_code`]
    pub fn code(&self) -> Option<&str> {
        match self {
            ExposeError::Handler(err) => err
                .downcast_ref::<CodedError>()
                .map(|coded| coded.code.as_str()),
            _ => None,
        }
    }

    /// Whether this error was produced while building schemas or endpoints
    ///
    /// Construction errors abort startup; everything else is per call.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            ExposeError::UnsupportedType { .. }
                | ExposeError::Customizer { .. }
                | ExposeError::Extraction { .. }
                | ExposeError::Reflect { .. }
                | ExposeError::Spec(_)
                | ExposeError::DuplicatePath(_)
        )
    }
}

impl From<serde_json::Error> for ExposeError {
    fn from(err: serde_json::Error) -> Self {
        ExposeError::Serialization(err.to_string())
    }
}

/// An error carrying an application defined code
#[derive(Error, Debug)]
#[error("{source}")]
pub struct CodedError {
    code: String,
    source: BoxError,
}

impl CodedError {
    /// The application code
    pub fn code(&self) -> &str {
        &self.code
    }
}

/// Attach an application code to an error returned by an exposed function
pub fn with_code(err: impl Into<BoxError>, code: impl Into<String>) -> CodedError {
    CodedError {
        code: code.into(),
        source: err.into(),
    }
}

//! OpenAPI document model and assembly

use std::collections::BTreeMap;

use expose_core::{ExposeError, ExposeResult, ReflectSettings, SchemaRef, SchemaTable, reflect_schema_of};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::codec::JSON_CONTENT_TYPE;
use crate::function::Function;

/// OpenAPI version written into every assembled document
pub const OPENAPI_VERSION: &str = "3.0.2";

/// An OpenAPI 3 document
///
/// Only the parts written by [`reflect_spec`] are modelled; everything else in a template is
/// kept in `extensions` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    #[serde(default)]
    pub openapi: String,
    #[serde(default)]
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub components: Components,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Default for Info {
    fn default() -> Self {
        Self {
            title: "expose".to_string(),
            version: "0.0.0".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// Other methods and fields of a template path item
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaRef,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub description: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: SchemaTable,
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl OpenApi {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: Info {
                title: title.into(),
                version: version.into(),
                description: None,
            },
            ..Self::default()
        }
    }

    pub fn from_json(bytes: &[u8]) -> ExposeResult<Self> {
        serde_json::from_slice(bytes).map_err(Into::into)
    }

    /// The `POST` operation registered at `path`
    pub fn operation(&self, path: &str) -> Option<&Operation> {
        self.paths.get(path).and_then(|item| item.post.as_ref())
    }

    /// Schema of the JSON request body of the operation at `path`
    pub fn request_schema(&self, path: &str) -> Option<&SchemaRef> {
        self.operation(path)?
            .request_body
            .as_ref()?
            .content
            .get(JSON_CONTENT_TYPE)
            .map(|media| &media.schema)
    }

    /// Follow a reference into `components.schemas`; inline schemas are returned as is
    pub fn resolve<'a>(&'a self, schema: &'a SchemaRef) -> Option<&'a SchemaRef> {
        match schema.ref_id() {
            Some(id) => self.components.schemas.get(id),
            None => Some(schema),
        }
    }
}

fn json_content(schema: SchemaRef) -> BTreeMap<String, MediaType> {
    BTreeMap::from([(JSON_CONTENT_TYPE.to_string(), MediaType { schema })])
}

/// Assemble the OpenAPI document for `functions` on top of `template`
///
/// Every function becomes a `POST` operation at its path. Schemas of requests and responses
/// are registered in `components.schemas`, seeded with the schemas of the template.
pub fn reflect_spec(
    template: OpenApi,
    functions: &[Function],
    settings: &ReflectSettings,
) -> ExposeResult<OpenApi> {
    assemble(template, functions, settings).map_err(|err| ExposeError::Spec(Box::new(err)))
}

fn assemble(
    mut spec: OpenApi,
    functions: &[Function],
    settings: &ReflectSettings,
) -> ExposeResult<OpenApi> {
    spec.openapi = OPENAPI_VERSION.to_string();
    let mut table = std::mem::take(&mut spec.components.schemas);

    for function in functions {
        let item = spec.paths.entry(function.path().to_string()).or_default();
        if item.post.is_some() {
            return Err(ExposeError::DuplicatePath(function.path().to_string()));
        }

        let request_body = if function.is_nullary() {
            None
        } else {
            let schema = reflect_schema_of(function.request(), &mut table, settings)?;
            Some(RequestBody {
                content: json_content(schema),
            })
        };

        let response = Response {
            description: "OK".to_string(),
            content: json_content(reflect_schema_of(function.response(), &mut table, settings)?),
        };

        let module = function.module();
        item.post = Some(Operation {
            operation_id: function.operation_id(),
            tags: vec![module],
            request_body,
            responses: BTreeMap::from([("200".to_string(), response)]),
        });
        debug!(path = %function.path(), "added operation");
    }

    spec.components.schemas = table;
    Ok(spec)
}

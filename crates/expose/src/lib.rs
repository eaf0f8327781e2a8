//! # expose
//!
//! Expose plain Rust functions and service structs as RPC endpoints described by an OpenAPI
//! document.
//!
//! expose reflects the request and response types of every endpoint into a deduplicated
//! schema table, providing:
//! - Schema reflection driven by `#[derive(Reflect)]` and serde attributes
//! - Endpoint discovery over object graphs with `#[derive(Expose)]` and `#[exposed]`
//! - OpenAPI 3 document assembly
//! - Transport independent call dispatch through pluggable codecs
//!
//! ## Exposing Functions
//!
//! ```ignore
//! use expose::prelude::*;
//!
//! #[derive(Debug, Serialize, Deserialize, Reflect)]
//! pub struct Delta {
//!     pub by: i32,
//! }
//!
//! let inc = func("/counter/inc", |_ctx: Context, delta: Delta| async move {
//!     Ok::<_, anyhow::Error>(delta.by + 1)
//! });
//!
//! let handler = Handler::new(vec![inc], HandlerOptions::new())?;
//! println!("{}", serde_json::to_string_pretty(handler.spec())?);
//! ```
//!
//! ## Exposing Structs
//!
//! ```ignore
//! #[derive(Expose)]
//! pub struct Application {
//!     pub users: UserService,
//! }
//!
//! #[derive(Expose)]
//! pub struct UserService;
//!
//! #[exposed]
//! impl UserService {
//!     pub async fn get(&self, _ctx: Context, id: u64) -> Result<User, ServiceError> {
//!         // ...
//!     }
//! }
//!
//! let functions = discover("/app", Arc::new(app), FunctionSettings::new())?;
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`expose_core`] - Type descriptors, schema generation and the schema table
//! - [`expose_rpc`] - Functions, discovery, document assembly and dispatch
//! - [`expose_macros`] - Procedural macros (`Reflect`, `Expose`, `#[exposed]`)

pub mod logging;

// Re-export core types
pub use expose_core::{
    BoxError, CodedError, DescriptorFn, ExposeConfig, ExposeError, ExposeResult, FieldContext,
    FieldDescriptor, FieldTag, FnCustomizer, GenericArgs, Generator, ID_EXTENSION,
    IGNORE_SENTINEL, IdentifierStrategy, MapSchema, MarkRequired, OmitPolicy, Primitive, Reflect,
    ReflectSettings, SCHEMA_REF_PREFIX, Schema, SchemaCustomizer, SchemaIdentifier,
    SchemaMapper, SchemaProvider, SchemaProviderFn, SchemaRef, SchemaTable, StampIdentifier,
    TypeDescriptor, TypeKind, UseProvidedSchema, customizer_fn, default_schema_identifier,
    extract_sub_schemas, generic_name, qualified_name, reflect_schema, reflect_schema_of,
    reflect_value, required_props, schema_ref_path, short_name, short_schema_identifier,
    walk_descendants, walk_schema, with_code,
};

// Re-export RPC types
pub use expose_rpc::{
    BoxFuture, Codec, CodecError, Codecs, Components, Context, ErrorBody, Exposable, Field,
    Function, FunctionSettings, Handler, HandlerOptions, Info, Invoke, JSON_CONTENT_TYPE,
    JsonCodec, MediaType, Method, MethodFn, Node, OPENAPI_VERSION, OpenApi, Operation, PathItem,
    Reply, RequestBody, Response, Server, Traverse, Void, decode_request, discover,
    discover_dyn, encode_response, func, func_nullary, func_nullary_void, func_void,
    reflect_spec,
};

// Re-export macros
pub use expose_macros::{Expose, Reflect, exposed};

// Re-export common dependencies that service authors need
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use tracing;

/// Support code for the generated implementations
#[doc(hidden)]
pub use expose_rpc::__private;

/// Prelude module for convenient imports.
///
/// Use `use expose::prelude::*;` to import commonly used types.
///
/// This includes:
/// - Entry points: `func` and friends, `discover`, `reflect_spec`, `Handler`
/// - Core types: `Context`, `Void`, `ExposeError`, `ExposeResult`, `ReflectSettings`
/// - Macros: `Reflect`, `Expose`, `#[exposed]`
/// - Common deps: `Serialize`, `Deserialize`
pub mod prelude {
    // Entry points and types
    pub use crate::{
        Context, ExposeConfig, ExposeError, ExposeResult, Function, FunctionSettings, Handler,
        HandlerOptions, OpenApi, ReflectSettings, SchemaTable, Void, discover, func,
        func_nullary, func_nullary_void, func_void, reflect_schema, reflect_spec,
    };

    // Traits and derives of the same name
    pub use crate::{Expose, Exposable, Reflect, exposed};

    // Serde derives (commonly needed for request and response types)
    pub use serde::{Deserialize, Serialize};
}

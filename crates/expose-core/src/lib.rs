//! expose-core - Schema reflection engine
//!
//! Turns native types into a deduplicated OpenAPI schema table:
//! - [`Reflect`] and [`TypeDescriptor`] describe types at runtime
//! - [`reflect_schema`] builds a type into a [`SchemaTable`] and returns a reference
//! - [`SchemaCustomizer`] steps adjust every generated node
//! - [`ExposeError`] for error handling
//! - [`ExposeConfig`] for configuration

mod config;
mod customizer;
mod descriptor;
mod error;
mod generator;
mod naming;
mod required;
mod schema;
mod settings;
mod walk;

pub use config::{ExposeConfig, IdentifierStrategy};
pub use customizer::{
    FieldContext, FnCustomizer, MapSchema, MarkRequired, SchemaCustomizer, StampIdentifier,
    UseProvidedSchema, customizer_fn,
};
pub use descriptor::{
    DescriptorFn, FieldDescriptor, FieldTag, GenericArgs, IGNORE_SENTINEL, OmitPolicy, Primitive,
    Reflect, SchemaProvider, SchemaProviderFn, TypeDescriptor, TypeKind,
};
pub use error::{BoxError, CodedError, ExposeError, ExposeResult, with_code};
pub use generator::{Generator, reflect_schema, reflect_schema_of, reflect_value};
pub use naming::{
    SchemaIdentifier, default_schema_identifier, generic_name, qualified_name, short_name,
    short_schema_identifier,
};
pub use required::required_props;
pub use schema::{ID_EXTENSION, SCHEMA_REF_PREFIX, Schema, SchemaRef, SchemaTable, schema_ref_path};
pub use settings::{ReflectSettings, SchemaMapper};
pub use walk::{extract_sub_schemas, walk_descendants, walk_schema};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ExposeConfig, ExposeError, ExposeResult, Generator, Reflect, ReflectSettings, Schema,
        SchemaCustomizer, SchemaProvider, SchemaRef, SchemaTable, TypeDescriptor, reflect_schema,
    };
}

#[cfg(test)]
mod lib_tests;

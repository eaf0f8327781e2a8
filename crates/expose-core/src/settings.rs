//! Reflection settings

use std::fmt;
use std::sync::Arc;

use crate::config::ExposeConfig;
use crate::customizer::SchemaCustomizer;
use crate::descriptor::TypeDescriptor;
use crate::naming::{SchemaIdentifier, default_schema_identifier};
use crate::schema::Schema;

/// Caller supplied type → schema override; `None` leaves the type to reflection
pub type SchemaMapper = Arc<dyn Fn(&TypeDescriptor) -> Option<Schema> + Send + Sync>;

/// Options for one schema build
#[derive(Clone)]
pub struct ReflectSettings {
    mapper: Option<SchemaMapper>,
    identifier: SchemaIdentifier,
    skip_extract_sub_schemas: bool,
    customizers: Vec<Arc<dyn SchemaCustomizer>>,
}

impl Default for ReflectSettings {
    fn default() -> Self {
        Self {
            mapper: None,
            identifier: default_schema_identifier(),
            skip_extract_sub_schemas: false,
            customizers: Vec::new(),
        }
    }
}

impl ReflectSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings matching the identifier strategy and extraction flag of a config
    pub fn from_config(config: &ExposeConfig) -> Self {
        Self::new()
            .with_schema_identifier(config.identifiers.identifier())
            .skip_extract_sub_schemas(!config.extract_sub_schemas)
    }

    pub fn with_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> Option<Schema> + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    pub fn with_schema_identifier(mut self, identifier: SchemaIdentifier) -> Self {
        self.identifier = identifier;
        self
    }

    /// Append customizers; they run after identifier stamping and before the mapper.
    /// Repeated calls are cumulative.
    pub fn with_customizers<I>(mut self, customizers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn SchemaCustomizer>>,
    {
        self.customizers.extend(customizers);
        self
    }

    pub fn with_customizer(mut self, customizer: impl SchemaCustomizer + 'static) -> Self {
        self.customizers.push(Arc::new(customizer));
        self
    }

    /// Keep nested schemas inline instead of promoting them into the table
    pub fn skip_extract_sub_schemas(mut self, skip: bool) -> Self {
        self.skip_extract_sub_schemas = skip;
        self
    }

    pub fn mapper(&self) -> Option<&SchemaMapper> {
        self.mapper.as_ref()
    }

    pub fn identifier(&self) -> &SchemaIdentifier {
        &self.identifier
    }

    /// Table identifier of `ty`
    pub fn identify(&self, ty: &TypeDescriptor) -> String {
        (self.identifier)(ty)
    }

    pub fn extracts_sub_schemas(&self) -> bool {
        !self.skip_extract_sub_schemas
    }

    pub fn customizers(&self) -> &[Arc<dyn SchemaCustomizer>] {
        &self.customizers
    }
}

impl fmt::Debug for ReflectSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReflectSettings")
            .field("mapper", &self.mapper.is_some())
            .field("skip_extract_sub_schemas", &self.skip_extract_sub_schemas)
            .field("customizers", &self.customizers.len())
            .finish()
    }
}

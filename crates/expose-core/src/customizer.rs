//! Schema customizer pipeline
//!
//! Every node the generator builds runs through a fixed chain of steps:
//!
//! 1. [`StampIdentifier`] marks nested structs with their pending identifier
//! 2. caller customizers, in registration order
//! 3. [`MapSchema`] applies the caller's type mapper
//! 4. [`UseProvidedSchema`] defers to types implementing [`SchemaProvider`](crate::SchemaProvider)
//! 5. [`MarkRequired`] records the required properties
//!
//! A step returning [`ControlFlow::Break`] ends the chain for the current node only.

use std::any::TypeId;
use std::ops::ControlFlow;
use std::sync::Arc;

use tracing::trace;

use crate::descriptor::{FieldTag, TypeDescriptor};
use crate::error::{ExposeError, ExposeResult};
use crate::generator::Generator;
use crate::naming::SchemaIdentifier;
use crate::required::required_props;
use crate::schema::{Schema, SchemaRef};
use crate::settings::{ReflectSettings, SchemaMapper};

/// What the pipeline knows about the node being built
#[derive(Debug, Clone, Copy)]
pub struct FieldContext<'a> {
    /// Name of the field holding the node, empty for the root
    pub field_name: &'a str,
    /// Type of the node, pointers already stripped
    pub ty: &'a TypeDescriptor,
    pub tag: &'a FieldTag,
}

/// One step of the pipeline
pub trait SchemaCustomizer: Send + Sync {
    fn customize(
        &self,
        field: &FieldContext<'_>,
        generator: &mut Generator<'_>,
        schema: &mut Schema,
    ) -> ExposeResult<ControlFlow<()>>;
}

/// Customizer backed by a closure, see [`customizer_fn`]
pub struct FnCustomizer<F>(F);

/// Wrap a closure as a customizer
///
/// ```ignore
/// let describe = customizer_fn(|field, schema| {
///     if field.field_name == "email" {
///         schema.format = Some("email".into());
///     }
///     Ok(ControlFlow::Continue(()))
/// });
/// ```
pub fn customizer_fn<F>(f: F) -> FnCustomizer<F>
where
    F: Fn(&FieldContext<'_>, &mut Schema) -> ExposeResult<ControlFlow<()>> + Send + Sync,
{
    FnCustomizer(f)
}

impl<F> SchemaCustomizer for FnCustomizer<F>
where
    F: Fn(&FieldContext<'_>, &mut Schema) -> ExposeResult<ControlFlow<()>> + Send + Sync,
{
    fn customize(
        &self,
        field: &FieldContext<'_>,
        _generator: &mut Generator<'_>,
        schema: &mut Schema,
    ) -> ExposeResult<ControlFlow<()>> {
        (self.0)(field, schema)
    }
}

/// Writes the pending identifier of nested structs into the `$id` extension
pub struct StampIdentifier {
    root: TypeId,
    identifier: SchemaIdentifier,
}

impl StampIdentifier {
    pub fn new(root: &TypeDescriptor, identifier: SchemaIdentifier) -> Self {
        Self {
            root: root.deref().type_id,
            identifier,
        }
    }
}

impl SchemaCustomizer for StampIdentifier {
    fn customize(
        &self,
        field: &FieldContext<'_>,
        _generator: &mut Generator<'_>,
        schema: &mut Schema,
    ) -> ExposeResult<ControlFlow<()>> {
        if field.ty.is_struct() && field.ty.type_id != self.root {
            schema.set_id(&(self.identifier)(field.ty));
        }
        Ok(ControlFlow::Continue(()))
    }
}

/// Replaces the node with the mapper's schema, if it returns one
pub struct MapSchema(pub SchemaMapper);

impl SchemaCustomizer for MapSchema {
    fn customize(
        &self,
        field: &FieldContext<'_>,
        _generator: &mut Generator<'_>,
        schema: &mut Schema,
    ) -> ExposeResult<ControlFlow<()>> {
        match (self.0)(field.ty) {
            Some(mapped) => {
                trace!(type_name = %field.ty.name, "schema mapped");
                *schema = mapped;
                Ok(ControlFlow::Break(()))
            }
            None => Ok(ControlFlow::Continue(())),
        }
    }
}

/// Replaces the node with the schema a self-describing type provides
pub struct UseProvidedSchema;

impl SchemaCustomizer for UseProvidedSchema {
    fn customize(
        &self,
        field: &FieldContext<'_>,
        generator: &mut Generator<'_>,
        schema: &mut Schema,
    ) -> ExposeResult<ControlFlow<()>> {
        let Some(provider) = field.ty.provider else {
            return Ok(ControlFlow::Continue(()));
        };

        *schema = match provider(generator)? {
            SchemaRef {
                reference: None,
                value: Some(value),
            } => value,
            SchemaRef {
                reference: Some(reference),
                ..
            } => Schema {
                all_of: vec![SchemaRef {
                    reference: Some(reference),
                    value: None,
                }],
                ..Schema::default()
            },
            SchemaRef {
                reference: None,
                value: None,
            } => Schema::default(),
        };
        Ok(ControlFlow::Break(()))
    }
}

/// Appends the required properties of the node's type
pub struct MarkRequired;

impl SchemaCustomizer for MarkRequired {
    fn customize(
        &self,
        field: &FieldContext<'_>,
        _generator: &mut Generator<'_>,
        schema: &mut Schema,
    ) -> ExposeResult<ControlFlow<()>> {
        schema.required.extend(required_props(field.ty));
        Ok(ControlFlow::Continue(()))
    }
}

/// The composed chain for one build
pub(crate) struct Pipeline {
    steps: Vec<Arc<dyn SchemaCustomizer>>,
}

impl Pipeline {
    pub(crate) fn for_root(root: &TypeDescriptor, settings: &ReflectSettings) -> Self {
        let mut steps: Vec<Arc<dyn SchemaCustomizer>> = vec![Arc::new(StampIdentifier::new(
            root,
            settings.identifier().clone(),
        ))];
        steps.extend(settings.customizers().iter().cloned());
        if let Some(mapper) = settings.mapper() {
            steps.push(Arc::new(MapSchema(mapper.clone())));
        }
        steps.push(Arc::new(UseProvidedSchema));
        steps.push(Arc::new(MarkRequired));
        Self { steps }
    }

    pub(crate) fn run(
        &self,
        field: &FieldContext<'_>,
        generator: &mut Generator<'_>,
        schema: &mut Schema,
    ) -> ExposeResult<()> {
        for step in &self.steps {
            let flow = step
                .customize(field, generator, schema)
                .map_err(|source| ExposeError::Customizer {
                    type_name: field.ty.display_name(),
                    field: field.field_name.to_string(),
                    source: Box::new(source),
                })?;
            if flow.is_break() {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "customizer/customizer_tests.rs"]
mod customizer_tests;

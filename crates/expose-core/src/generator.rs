//! Schema generation
//!
//! [`reflect_schema`] turns a type into a schema registered in a [`SchemaTable`] and returns a
//! reference to it. A type whose identifier is already in the table is never rebuilt.

use std::any::TypeId;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace};

use crate::customizer::{FieldContext, Pipeline};
use crate::descriptor::{FieldDescriptor, FieldTag, Reflect, TypeDescriptor, TypeKind};
use crate::error::{ExposeError, ExposeResult};
use crate::schema::{Schema, SchemaRef, SchemaTable};
use crate::settings::ReflectSettings;
use crate::walk::extract_sub_schemas;

/// Reflect the schema of `T` into `table`
pub fn reflect_schema<T: ?Sized + Reflect>(
    table: &mut SchemaTable,
    settings: &ReflectSettings,
) -> ExposeResult<SchemaRef> {
    reflect_schema_of(&T::descriptor(), table, settings)
}

/// Reflect the schema of the type of `value` into `table`
pub fn reflect_value<T: Reflect>(
    _value: &T,
    table: &mut SchemaTable,
    settings: &ReflectSettings,
) -> ExposeResult<SchemaRef> {
    reflect_schema_of(&T::descriptor(), table, settings)
}

/// Reflect the schema of `ty` into `table`
///
/// Returns a reference to the identifier of `ty`. Nested struct schemas are promoted into
/// the table as well unless extraction is disabled in `settings`.
pub fn reflect_schema_of(
    ty: &TypeDescriptor,
    table: &mut SchemaTable,
    settings: &ReflectSettings,
) -> ExposeResult<SchemaRef> {
    build(ty, table, settings, &mut Vec::new())
}

fn build(
    ty: &TypeDescriptor,
    table: &mut SchemaTable,
    settings: &ReflectSettings,
    in_progress: &mut Vec<TypeId>,
) -> ExposeResult<SchemaRef> {
    let id = settings.identify(ty);
    if table.contains(&id) {
        trace!(id = %id, "schema already registered");
        return Ok(SchemaRef::new_ref(&id));
    }

    let fail = |source: ExposeError| ExposeError::Reflect {
        type_name: ty.display_name(),
        source: Box::new(source),
    };

    let (mut root, recursive) = {
        let mut generator = Generator::new(ty, table, settings);
        generator.in_progress = std::mem::take(in_progress);
        let result = generator.generate_descriptor(ty);
        *in_progress = std::mem::take(&mut generator.in_progress);
        (result.map_err(fail)?, std::mem::take(&mut generator.recursive))
    };

    if settings.extracts_sub_schemas()
        && let Some(value) = root.value.as_mut()
    {
        extract_sub_schemas(value, table).map_err(fail)?;
    }

    table.insert(id.clone(), root);
    debug!(id = %id, "registered schema");

    // Self references emitted inside inline schemas must resolve in the table
    for nested in &recursive {
        if !in_progress.contains(&nested.type_id) && !table.contains(&settings.identify(nested)) {
            build(nested, table, settings, in_progress).map_err(fail)?;
        }
    }
    Ok(SchemaRef::new_ref(&id))
}

/// Working state of one build, handed to customizers and schema providers
pub struct Generator<'a> {
    settings: &'a ReflectSettings,
    table: &'a mut SchemaTable,
    pipeline: Arc<Pipeline>,
    in_progress: Vec<TypeId>,
    /// Types referenced while still being generated
    recursive: Vec<TypeDescriptor>,
}

impl<'a> Generator<'a> {
    pub(crate) fn new(
        root: &TypeDescriptor,
        table: &'a mut SchemaTable,
        settings: &'a ReflectSettings,
    ) -> Self {
        Self {
            settings,
            table,
            pipeline: Arc::new(Pipeline::for_root(root, settings)),
            in_progress: Vec::new(),
            recursive: Vec::new(),
        }
    }

    pub fn settings(&self) -> &ReflectSettings {
        self.settings
    }

    /// Schemas registered so far
    pub fn table(&self) -> &SchemaTable {
        &*self.table
    }

    pub fn identify(&self, ty: &TypeDescriptor) -> String {
        self.settings.identify(ty)
    }

    /// Inline schema of `T`
    pub fn generate<T: ?Sized + Reflect>(&mut self) -> ExposeResult<SchemaRef> {
        self.generate_descriptor(&T::descriptor())
    }

    pub fn generate_descriptor(&mut self, ty: &TypeDescriptor) -> ExposeResult<SchemaRef> {
        self.node("", &FieldTag::default(), ty)
    }

    /// Reference to `T`, registering its schema in the table when missing
    pub fn reference<T: ?Sized + Reflect>(&mut self) -> ExposeResult<SchemaRef> {
        self.reference_descriptor(&T::descriptor())
    }

    pub fn reference_descriptor(&mut self, ty: &TypeDescriptor) -> ExposeResult<SchemaRef> {
        if self.in_progress.contains(&ty.deref().type_id) {
            self.note_recursive(ty.deref());
            return Ok(SchemaRef::new_ref(&self.identify(ty)));
        }
        build(ty, self.table, self.settings, &mut self.in_progress)
    }

    fn node(
        &mut self,
        field_name: &str,
        tag: &FieldTag,
        ty: &TypeDescriptor,
    ) -> ExposeResult<SchemaRef> {
        let ty = ty.deref();
        let tracked = matches!(ty.kind, TypeKind::Struct(_) | TypeKind::Newtype(_));

        if tracked && self.in_progress.contains(&ty.type_id) {
            if let TypeKind::Newtype(_) = ty.kind {
                return Err(ExposeError::UnsupportedType {
                    type_name: ty.display_name(),
                    reason: "newtype contains itself".to_string(),
                });
            }
            let id = self.identify(ty);
            trace!(id = %id, "recursive type, emitting reference");
            self.note_recursive(ty);
            return Ok(SchemaRef::new_ref(&id));
        }

        if tracked {
            self.in_progress.push(ty.type_id);
        }
        let result = self.customized(field_name, tag, ty);
        if tracked {
            self.in_progress.pop();
        }
        result.map(SchemaRef::inline)
    }

    fn note_recursive(&mut self, ty: &TypeDescriptor) {
        if !self.recursive.iter().any(|seen| seen.type_id == ty.type_id) {
            self.recursive.push(ty.clone());
        }
    }

    fn customized(
        &mut self,
        field_name: &str,
        tag: &FieldTag,
        ty: &TypeDescriptor,
    ) -> ExposeResult<Schema> {
        let mut schema = self.structure(field_name, tag, ty)?;
        if let Some(docs) = ty.docs {
            schema.description = Some(docs.trim().to_string());
        }

        let pipeline = Arc::clone(&self.pipeline);
        let field = FieldContext {
            field_name,
            ty,
            tag,
        };
        pipeline.run(&field, self, &mut schema)?;
        Ok(schema)
    }

    fn structure(
        &mut self,
        field_name: &str,
        tag: &FieldTag,
        ty: &TypeDescriptor,
    ) -> ExposeResult<Schema> {
        match &ty.kind {
            TypeKind::Primitive(primitive) => Ok(primitive.schema()),
            TypeKind::Struct(fields) => {
                let mut schema = Schema::object();
                self.properties(fields, &mut schema)?;
                Ok(schema)
            }
            TypeKind::Newtype(inner) => match self.node(field_name, tag, &inner())? {
                SchemaRef {
                    reference: None,
                    value: Some(value),
                } => Ok(value),
                other => Ok(Schema {
                    all_of: vec![other],
                    ..Schema::default()
                }),
            },
            TypeKind::Enum(variants) => Ok(Schema {
                enumeration: variants
                    .iter()
                    .map(|variant| Value::String(variant.to_string()))
                    .collect(),
                ..Schema::of_type("string")
            }),
            TypeKind::List(elem) => Ok(Schema::array(self.node(field_name, tag, elem)?)),
            TypeKind::Map(value) => Ok(Schema {
                additional_properties: Some(Box::new(self.node(field_name, tag, value)?)),
                ..Schema::object()
            }),
            TypeKind::Pointer(inner) | TypeKind::Optional(inner) => {
                self.structure(field_name, tag, inner)
            }
            TypeKind::Dynamic => Ok(Schema::default()),
            TypeKind::Unsupported(reason) => Err(ExposeError::UnsupportedType {
                type_name: ty.display_name(),
                reason: reason.to_string(),
            }),
        }
    }

    fn properties(&mut self, fields: &[FieldDescriptor], schema: &mut Schema) -> ExposeResult<()> {
        for field in fields {
            if field.is_ignored() {
                continue;
            }
            let Some(describe) = field.ty else {
                continue;
            };
            let ty = describe();

            if field.tag.flatten {
                match &ty.deref().kind {
                    TypeKind::Struct(inner) => {
                        self.properties(inner, schema)?;
                        continue;
                    }
                    TypeKind::Map(value) => {
                        let extra = self.node(field.name, &field.tag, value)?;
                        schema.additional_properties = Some(Box::new(extra));
                        continue;
                    }
                    _ => {}
                }
            }

            let mut property = self.node(field.name, &field.tag, &ty)?;
            if let (Some(docs), Some(value)) = (field.docs, property.value.as_mut())
                && value.id().is_none()
            {
                value.description = Some(docs.trim().to_string());
            }
            schema
                .properties
                .insert(field.resolved_name().to_string(), property);
        }
        Ok(())
    }
}

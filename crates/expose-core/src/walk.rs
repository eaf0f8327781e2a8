//! Schema tree traversal and sub schema extraction

use tracing::{debug, trace};

use crate::error::ExposeResult;
use crate::schema::{Schema, SchemaRef, SchemaTable};

/// Visit every inline node below and including `schema_ref`, children first
///
/// Order: `allOf`, `anyOf`, `oneOf`, `items`, `additionalProperties`, then the properties.
/// When the visitor returns a replacement it overwrites the visited node. References
/// without an inline value are skipped. Errors abort the walk and carry the position of
/// the failing node (`items: prop name: …`).
pub fn walk_schema<F>(schema_ref: &mut SchemaRef, visitor: &mut F) -> ExposeResult<()>
where
    F: FnMut(&mut SchemaRef) -> ExposeResult<Option<SchemaRef>>,
{
    let Some(schema) = schema_ref.value.as_mut() else {
        return Ok(());
    };
    walk_descendants(schema, visitor)?;

    if let Some(replacement) = visitor(schema_ref)? {
        *schema_ref = replacement;
    }
    Ok(())
}

/// Like [`walk_schema`] but never visits `schema` itself
pub fn walk_descendants<F>(schema: &mut Schema, visitor: &mut F) -> ExposeResult<()>
where
    F: FnMut(&mut SchemaRef) -> ExposeResult<Option<SchemaRef>>,
{
    for (label, members) in [
        ("allOf", &mut schema.all_of),
        ("anyOf", &mut schema.any_of),
        ("oneOf", &mut schema.one_of),
    ] {
        for member in members.iter_mut() {
            walk_schema(member, visitor).map_err(|err| err.in_context(label))?;
        }
    }

    if let Some(items) = schema.items.as_deref_mut() {
        walk_schema(items, visitor).map_err(|err| err.in_context("items"))?;
    }

    if let Some(extra) = schema.additional_properties.as_deref_mut() {
        walk_schema(extra, visitor).map_err(|err| err.in_context("additionalProperties"))?;
    }

    for (name, property) in schema.properties.iter_mut() {
        walk_schema(property, visitor).map_err(|err| err.in_context(format!("prop {name}")))?;
    }
    Ok(())
}

/// Move every stamped descendant of `schema` into `table`, leaving references behind
///
/// A descendant whose identifier is already registered is replaced by a reference to the
/// existing entry. `schema` itself stays in place.
pub fn extract_sub_schemas(schema: &mut Schema, table: &mut SchemaTable) -> ExposeResult<()> {
    walk_descendants(schema, &mut |node: &mut SchemaRef| {
        let Some(id) = node.value.as_ref().and_then(Schema::id).map(str::to_string) else {
            return Ok(None);
        };

        if table.contains(&id) {
            trace!(id = %id, "sub schema already registered");
        } else {
            table.insert(id.clone(), std::mem::take(node));
            debug!(id = %id, "extracted sub schema");
        }
        Ok(Some(SchemaRef::new_ref(&id)))
    })
}

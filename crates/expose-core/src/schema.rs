//! OpenAPI schema model and the shared schema table

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Prefix of every reference into the schema table
pub const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Extension key holding the pending identifier of a nested schema
pub const ID_EXTENSION: &str = "$id";

/// Reference string for a table identifier
pub fn schema_ref_path(id: &str) -> String {
    format!("{SCHEMA_REF_PREFIX}{id}")
}

/// One schema fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, SchemaRef>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaRef>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaRef>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaRef>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaRef>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    /// Free-form metadata (`x-…` keys and the pending `$id`)
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

fn is_false(value: &bool) -> bool {
    !value
}

impl Schema {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn object() -> Self {
        Self::of_type("object")
    }

    pub fn array(items: SchemaRef) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type("array")
        }
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, schema: impl Into<SchemaRef>) -> Self {
        self.properties.insert(name.into(), schema.into());
        self
    }

    /// Pending identifier stamped on a nested schema, without the leading `#`
    pub fn id(&self) -> Option<&str> {
        self.extensions
            .get(ID_EXTENSION)
            .and_then(Value::as_str)
            .map(|id| id.trim_start_matches('#'))
    }

    pub fn set_id(&mut self, id: &str) {
        self.extensions
            .insert(ID_EXTENSION.to_string(), Value::String(format!("#{id}")));
    }
}

/// A schema given inline, or a reference into the schema table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRef {
    pub reference: Option<String>,
    pub value: Option<Schema>,
}

impl SchemaRef {
    /// Reference to a table identifier
    pub fn new_ref(id: &str) -> Self {
        Self {
            reference: Some(schema_ref_path(id)),
            value: None,
        }
    }

    pub fn inline(schema: Schema) -> Self {
        Self {
            reference: None,
            value: Some(schema),
        }
    }

    /// Table identifier this reference points to
    pub fn ref_id(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|reference| reference.strip_prefix(SCHEMA_REF_PREFIX))
    }

    pub fn is_ref(&self) -> bool {
        self.reference.is_some()
    }
}

impl From<Schema> for SchemaRef {
    fn from(schema: Schema) -> Self {
        SchemaRef::inline(schema)
    }
}

#[derive(Serialize)]
struct RefOnly<'a> {
    #[serde(rename = "$ref")]
    reference: &'a str,
}

impl Serialize for SchemaRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (&self.reference, &self.value) {
            (Some(reference), _) => RefOnly { reference }.serialize(serializer),
            (None, Some(value)) => value.serialize(serializer),
            (None, None) => Schema::default().serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSchemaRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Inline(Box<Schema>),
}

impl<'de> Deserialize<'de> for SchemaRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawSchemaRef::deserialize(deserializer)? {
            RawSchemaRef::Ref { reference } => SchemaRef {
                reference: Some(reference),
                value: None,
            },
            RawSchemaRef::Inline(schema) => SchemaRef::inline(*schema),
        })
    }
}

/// Identifier → schema mapping shared by one build
///
/// Entries are never replaced: the first definition registered under an identifier wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaTable(BTreeMap<String, SchemaRef>);

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&SchemaRef> {
        self.0.get(id)
    }

    /// Register a schema; returns `false` and keeps the existing entry if the id is taken
    pub fn insert(&mut self, id: impl Into<String>, schema: SchemaRef) -> bool {
        match self.0.entry(id.into()) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(schema);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaRef)> {
        self.0.iter().map(|(id, schema)| (id.as_str(), schema))
    }

    pub fn into_inner(self) -> BTreeMap<String, SchemaRef> {
        self.0
    }
}

impl From<BTreeMap<String, SchemaRef>> for SchemaTable {
    fn from(schemas: BTreeMap<String, SchemaRef>) -> Self {
        Self(schemas)
    }
}

//! Reflection integration tests
//!
//! These tests run `#[derive(Reflect)]` types through schema generation and document
//! assembly:
//! - Shared types produce a single schema table entry
//! - serde attributes drive property names and required lists
//! - Mappers and providers replace generated schemas

#![allow(non_snake_case)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use expose::prelude::*;
use expose::{
    Generator, Schema, SchemaProvider, SchemaRef, TypeDescriptor, qualified_name, schema_ref_path,
};
use serde_json::json;

/// A postal address
#[derive(Debug, Clone, Serialize, Deserialize, Reflect)]
pub struct Address {
    pub street: String,
    pub city: String,
}

#[derive(Debug, Serialize, Deserialize, Reflect)]
pub struct Shipment {
    pub from: Address,
    pub to: Address,
}

#[derive(Debug, Serialize, Deserialize, Reflect)]
pub struct Invoice {
    pub billing: Address,
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    #[serde(rename = "mail")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nick_name: Option<String>,
    #[serde(skip)]
    pub session: String,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Default, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
    pub created_by: String,
    #[serde(default)]
    pub updated_by: String,
}

#[derive(Debug, Serialize, Deserialize, Reflect)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Suspended,
}

#[derive(Debug, Serialize, Deserialize, Reflect)]
pub struct UserId(pub u64);

#[derive(Debug, Serialize, Deserialize, Reflect)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Tree node
#[derive(Debug, Serialize, Deserialize, Reflect)]
pub struct TreeNode {
    pub label: String,
    pub children: Vec<TreeNode>,
}

#[derive(Debug, Serialize, Deserialize, Reflect)]
#[expose(provider)]
pub struct Timestamp(pub String);

impl SchemaProvider for Timestamp {
    fn schema(_generator: &mut Generator<'_>) -> ExposeResult<SchemaRef> {
        Ok(Schema::of_type("string").with_format("date-time").into())
    }
}

fn id_of<T: Reflect>() -> String {
    qualified_name(&T::descriptor())
}

fn entry<'a>(table: &'a SchemaTable, id: &str) -> &'a Schema {
    table
        .get(id)
        .and_then(|schema| schema.value.as_ref())
        .unwrap_or_else(|| panic!("no inline schema registered for {id}"))
}

fn property<'a>(schema: &'a Schema, name: &str) -> &'a SchemaRef {
    schema
        .properties
        .get(name)
        .unwrap_or_else(|| panic!("no property {name}"))
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[test]
fn reflect_spec___two_counter_functions___share_one_integer_schema() {
    let functions = vec![
        func("/counter/inc", |_ctx: Context, by: i32| async move {
            Ok::<_, std::io::Error>(by + 1)
        }),
        func_nullary("/counter/get", |_ctx: Context| async {
            Ok::<_, std::io::Error>(0_i32)
        }),
    ];

    let spec = reflect_spec(OpenApi::default(), &functions, &ReflectSettings::new()).unwrap();

    let modules: Vec<String> = functions.iter().map(|function| function.module()).collect();
    assert_eq!(modules, vec!["counter", "counter"]);
    assert_eq!(spec.operation("/counter/inc").unwrap().operation_id, "counter#inc");
    assert_eq!(spec.operation("/counter/get").unwrap().operation_id, "counter#get");
    assert_eq!(spec.components.schemas.ids().collect::<Vec<_>>(), vec!["i32"]);
}

#[test]
fn reflect_schema___nested_type_used_twice___registers_one_entry_referenced_twice() {
    let mut table = SchemaTable::new();

    let root = reflect_schema::<Shipment>(&mut table, &ReflectSettings::new()).unwrap();

    let address = id_of::<Address>();
    assert_eq!(root.ref_id(), Some(id_of::<Shipment>().as_str()));
    assert_eq!(table.len(), 2);
    let shipment = entry(&table, &id_of::<Shipment>());
    let expected = SchemaRef::new_ref(&address);
    assert_eq!(property(shipment, "from"), &expected);
    assert_eq!(property(shipment, "to"), &expected);
}

#[test]
fn reflect_schema___nested_type_across_builds___reuses_first_entry() {
    let mut table = SchemaTable::new();
    let settings = ReflectSettings::new();

    reflect_schema::<Shipment>(&mut table, &settings).unwrap();
    reflect_schema::<Invoice>(&mut table, &settings).unwrap();

    assert_eq!(table.len(), 3);
    let invoice = entry(&table, &id_of::<Invoice>());
    assert_eq!(
        property(invoice, "billing").reference.as_deref(),
        Some(schema_ref_path(&id_of::<Address>()).as_str())
    );
}

// ============================================================================
// serde attributes
// ============================================================================

#[test]
fn derive_Reflect___serde_attributes___shape_properties_and_required() {
    let mut table = SchemaTable::new();

    reflect_schema::<Profile>(&mut table, &ReflectSettings::new()).unwrap();

    let profile = entry(&table, &id_of::<Profile>());
    let names: Vec<&str> = profile.properties.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["createdBy", "displayName", "mail", "nickName", "updatedBy"]
    );
    assert_eq!(profile.required, vec!["displayName", "mail", "createdBy"]);
}

#[test]
fn derive_Reflect___option_field___takes_schema_of_inner_type() {
    let mut table = SchemaTable::new();

    reflect_schema::<Profile>(&mut table, &ReflectSettings::new()).unwrap();

    let profile = entry(&table, &id_of::<Profile>());
    let mail = property(profile, "mail").value.as_ref().unwrap();
    assert_eq!(mail.schema_type.as_deref(), Some("string"));
}

#[test]
fn derive_Reflect___unit_enum___lists_renamed_variants() {
    let mut table = SchemaTable::new();

    reflect_schema::<Status>(&mut table, &ReflectSettings::new()).unwrap();

    let status = entry(&table, &id_of::<Status>());
    assert_eq!(status.schema_type.as_deref(), Some("string"));
    assert_eq!(status.enumeration, vec![json!("active"), json!("suspended")]);
}

#[test]
fn derive_Reflect___newtype___takes_schema_of_inner_type() {
    let mut table = SchemaTable::new();

    reflect_schema::<UserId>(&mut table, &ReflectSettings::new()).unwrap();

    let user_id = entry(&table, &id_of::<UserId>());
    assert_eq!(user_id.schema_type.as_deref(), Some("integer"));
}

#[test]
fn derive_Reflect___generic_struct___is_named_after_arguments() {
    let descriptor = Page::<Address>::descriptor();

    assert_eq!(descriptor.name, "PageOfAddress");
}

#[test]
fn derive_Reflect___generic_struct___references_argument_schema() {
    let mut table = SchemaTable::new();

    reflect_schema::<Page<Address>>(&mut table, &ReflectSettings::new()).unwrap();

    let page = entry(&table, &id_of::<Page<Address>>());
    let items = property(page, "items").value.as_ref().unwrap();
    assert_eq!(
        items.items.as_deref(),
        Some(&SchemaRef::new_ref(&id_of::<Address>()))
    );
    assert_eq!(page.required, vec!["items", "next"]);
}

mod billing {
    use expose::prelude::*;

    #[derive(Debug, Serialize, Deserialize, Reflect)]
    pub struct User {
        pub account: String,
        pub balance: i64,
    }
}

mod auth {
    use expose::prelude::*;

    #[derive(Debug, Serialize, Deserialize, Reflect)]
    pub struct User {
        pub login: String,
    }
}

#[test]
fn reflect_schema___generic_over_same_named_types___registers_distinct_entries() {
    let mut table = SchemaTable::new();
    let settings = ReflectSettings::new();

    let billing = reflect_schema::<Page<billing::User>>(&mut table, &settings).unwrap();
    let auth = reflect_schema::<Page<auth::User>>(&mut table, &settings).unwrap();

    assert_ne!(billing.ref_id(), auth.ref_id());
    assert_eq!(table.len(), 4);
    let login = entry(&table, &id_of::<auth::User>());
    assert!(login.properties.contains_key("login"));
    let page = entry(&table, &id_of::<Page<auth::User>>());
    let items = property(page, "items").value.as_ref().unwrap();
    assert_eq!(
        items.items.as_deref(),
        Some(&SchemaRef::new_ref(&id_of::<auth::User>()))
    );
}

#[test]
fn derive_Reflect___doc_comments___become_descriptions() {
    let mut table = SchemaTable::new();

    reflect_schema::<Address>(&mut table, &ReflectSettings::new()).unwrap();

    let address = entry(&table, &id_of::<Address>());
    assert_eq!(address.description.as_deref(), Some("A postal address"));
}

#[test]
fn derive_Reflect___recursive_type___references_itself() {
    let mut table = SchemaTable::new();

    reflect_schema::<TreeNode>(&mut table, &ReflectSettings::new()).unwrap();

    let node = entry(&table, &id_of::<TreeNode>());
    let children = property(node, "children").value.as_ref().unwrap();
    assert_eq!(
        children.items.as_deref(),
        Some(&SchemaRef::new_ref(&id_of::<TreeNode>()))
    );
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn derive_Reflect___provider___replaces_generated_schema() {
    let mut table = SchemaTable::new();

    reflect_schema::<Timestamp>(&mut table, &ReflectSettings::new()).unwrap();

    let timestamp = entry(&table, &id_of::<Timestamp>());
    assert_eq!(timestamp.schema_type.as_deref(), Some("string"));
    assert_eq!(timestamp.format.as_deref(), Some("date-time"));
}

#[test]
fn ReflectSettings___mapper___is_consulted_once_per_registered_type() {
    let calls = Arc::new(AtomicUsize::new(0));
    let spy = Arc::clone(&calls);
    let settings = ReflectSettings::new().with_mapper(move |ty: &TypeDescriptor| {
        if ty.is::<Address>() {
            spy.fetch_add(1, Ordering::SeqCst);
        }
        None
    });
    let mut table = SchemaTable::new();

    reflect_schema::<Address>(&mut table, &settings).unwrap();
    reflect_schema::<Address>(&mut table, &settings).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(table.len(), 1);
}

#[test]
fn ReflectSettings___mapper___replaces_schema_wholesale() {
    let settings = ReflectSettings::new().with_mapper(|ty: &TypeDescriptor| {
        ty.is::<Address>()
            .then(|| Schema::of_type("string").with_description("formatted address"))
    });
    let mut table = SchemaTable::new();

    reflect_schema::<Shipment>(&mut table, &settings).unwrap();

    let shipment = entry(&table, &id_of::<Shipment>());
    let from = property(shipment, "from").value.as_ref().unwrap();
    assert_eq!(from.schema_type.as_deref(), Some("string"));
    assert!(from.properties.is_empty());
    assert!(!table.contains(&id_of::<Address>()));
}

#[test]
fn ReflectSettings___skip_extract_sub_schemas___keeps_nested_schemas_inline() {
    let settings = ReflectSettings::new().skip_extract_sub_schemas(true);
    let mut table = SchemaTable::new();

    reflect_schema::<Shipment>(&mut table, &settings).unwrap();

    assert_eq!(table.len(), 1);
    let shipment = entry(&table, &id_of::<Shipment>());
    let from = property(shipment, "from").value.as_ref().unwrap();
    let keys: Vec<&String> = from.properties.keys().collect();
    assert_eq!(keys, vec!["city", "street"]);
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn reflect_spec___template_schemas___are_kept_and_win() {
    let mut template = OpenApi::new("shop", "1.0.0");
    template.components.schemas.insert(
        id_of::<Address>(),
        Schema::of_type("string").with_description("from template").into(),
    );
    let functions = vec![func("/shop/ship", |_ctx: Context, shipment: Shipment| async move {
        Ok::<_, std::io::Error>(shipment.to)
    })];

    let spec = reflect_spec(template, &functions, &ReflectSettings::new()).unwrap();

    let address = entry(&spec.components.schemas, &id_of::<Address>());
    assert_eq!(address.description.as_deref(), Some("from template"));
    assert_eq!(spec.info.title, "shop");
    assert!(spec.components.schemas.contains(&id_of::<Shipment>()));
}

#[test]
fn reflect_spec___document___serializes_as_openapi_json() {
    let functions = vec![func_void("/shop/archive", |_ctx: Context, _id: UserId| async {
        Ok::<_, std::io::Error>(())
    })];

    let spec = reflect_spec(OpenApi::default(), &functions, &ReflectSettings::new()).unwrap();
    let value = serde_json::to_value(&spec).unwrap();

    assert_eq!(value["openapi"], json!("3.0.2"));
    let operation = &value["paths"]["/shop/archive"]["post"];
    assert_eq!(operation["operationId"], json!("shop#archive"));
    assert_eq!(operation["tags"], json!(["shop"]));
    assert_eq!(
        operation["requestBody"]["content"]["application/json"]["schema"]["$ref"],
        json!(schema_ref_path(&id_of::<UserId>()))
    );
    let schemas: BTreeMap<String, serde_json::Value> =
        serde_json::from_value(value["components"]["schemas"].clone()).unwrap();
    assert!(schemas.contains_key("expose.Void"));
}

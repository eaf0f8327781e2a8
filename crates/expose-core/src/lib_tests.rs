#![allow(non_snake_case)]

use super::*;

#[test]
fn prelude___exports___build_a_schema() {
    use crate::prelude::*;

    let mut table = SchemaTable::new();
    let schema_ref = reflect_schema::<Vec<String>>(&mut table, &ReflectSettings::new()).unwrap();

    assert_eq!(schema_ref.ref_id(), Some("StringList"));
    assert!(table.contains("StringList"));
}

#[test]
fn SCHEMA_REF_PREFIX___is_components_schemas() {
    assert_eq!(SCHEMA_REF_PREFIX, "#/components/schemas/");
    assert_eq!(schema_ref_path("i64"), "#/components/schemas/i64");
}

#[test]
fn reflect_value___sample___uses_its_type() {
    let mut table = SchemaTable::new();

    let schema_ref = reflect_value(&42u8, &mut table, &ReflectSettings::new()).unwrap();

    assert_eq!(schema_ref.ref_id(), Some("u8"));
}

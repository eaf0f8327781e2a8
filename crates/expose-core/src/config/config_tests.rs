#![allow(non_snake_case)]

use super::*;
use crate::descriptor::{FieldDescriptor, Reflect, TypeDescriptor};

#[test]
fn ExposeConfig___default___has_expected_values() {
    let config = ExposeConfig::default();

    assert_eq!(config.path_prefix, "");
    assert_eq!(config.spec_path, "/swagger.json");
    assert_eq!(config.identifiers, IdentifierStrategy::Default);
    assert!(config.extract_sub_schemas);
    assert!(!config.validate_requests);
    assert_eq!(config.log_level, "info");
}

#[test]
fn ExposeConfig___from_empty_bytes___returns_defaults() {
    let config = ExposeConfig::from_json(&[]).unwrap();

    assert_eq!(config, ExposeConfig::default());
}

#[test]
fn ExposeConfig___from_json___parses_all_fields() {
    let json = r#"{
        "path_prefix": "/rpc",
        "spec_path": "/openapi.json",
        "identifiers": "short",
        "extract_sub_schemas": false,
        "validate_requests": true,
        "log_level": "debug"
    }"#;

    let config = ExposeConfig::from_json(json.as_bytes()).unwrap();

    assert_eq!(config.path_prefix, "/rpc");
    assert_eq!(config.spec_path, "/openapi.json");
    assert_eq!(config.identifiers, IdentifierStrategy::Short);
    assert!(!config.extract_sub_schemas);
    assert!(config.validate_requests);
    assert_eq!(config.log_level, "debug");
}

#[test]
fn ExposeConfig___from_invalid_json___fails() {
    let result = ExposeConfig::from_json(b"{not json");

    assert!(result.is_err());
}

#[test]
fn ExposeConfig___from_json___rejects_unknown_strategy() {
    let result = ExposeConfig::from_json(br#"{"identifiers": "fancy"}"#);

    assert!(result.is_err());
}

#[test]
fn ExposeConfig___serde___roundtrips() {
    let config = ExposeConfig {
        path_prefix: "/api".into(),
        identifiers: IdentifierStrategy::Short,
        ..ExposeConfig::default()
    };

    let json = serde_json::to_vec(&config).unwrap();
    let parsed = ExposeConfig::from_json(&json).unwrap();

    assert_eq!(parsed, config);
}

struct Widget;

impl Reflect for Widget {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>(
            "Widget",
            "shop::catalog",
            vec![FieldDescriptor::new("sku", <String as Reflect>::descriptor)],
        )
    }
}

#[test]
fn IdentifierStrategy___default___uses_full_module_path() {
    let identifier = IdentifierStrategy::Default.identifier();

    assert_eq!(identifier(&Widget::descriptor()), "shop.catalog.Widget");
}

#[test]
fn IdentifierStrategy___short___uses_last_segment() {
    let identifier = IdentifierStrategy::Short.identifier();

    assert_eq!(identifier(&Widget::descriptor()), "catalog.Widget");
}

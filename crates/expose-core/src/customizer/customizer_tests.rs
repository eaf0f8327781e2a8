#![allow(non_snake_case)]

use serde_json::json;

use super::*;
use crate::descriptor::{FieldDescriptor, Reflect};
use crate::schema::SchemaTable;

struct Invoice;

impl Reflect for Invoice {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>(
            "Invoice",
            "billing",
            vec![
                FieldDescriptor::new("number", <String as Reflect>::descriptor),
                FieldDescriptor::new("lines", <Vec<Line> as Reflect>::descriptor),
            ],
        )
    }
}

struct Line;

impl Reflect for Line {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::structure::<Self>(
            "Line",
            "billing",
            vec![FieldDescriptor::new("amount", <f64 as Reflect>::descriptor)],
        )
    }
}

fn run(
    root: &TypeDescriptor,
    node: &TypeDescriptor,
    settings: &ReflectSettings,
) -> ExposeResult<Schema> {
    let mut table = SchemaTable::new();
    let mut generator = Generator::new(root, &mut table, settings);
    let pipeline = Pipeline::for_root(root, settings);
    let tag = FieldTag::default();
    let field = FieldContext {
        field_name: "field",
        ty: node,
        tag: &tag,
    };
    let mut schema = Schema::object();
    pipeline.run(&field, &mut generator, &mut schema)?;
    Ok(schema)
}

#[test]
fn StampIdentifier___nested_struct___gets_id() {
    let schema = run(
        &Invoice::descriptor(),
        &Line::descriptor(),
        &ReflectSettings::new(),
    )
    .unwrap();

    assert_eq!(schema.extensions["$id"], json!("#billing.Line"));
}

#[test]
fn StampIdentifier___root_behind_pointer___is_skipped() {
    let schema = run(
        &<Box<Invoice> as Reflect>::descriptor(),
        &Invoice::descriptor(),
        &ReflectSettings::new(),
    )
    .unwrap();

    assert_eq!(schema.id(), None);
}

#[test]
fn StampIdentifier___primitive___is_skipped() {
    let schema = run(
        &Invoice::descriptor(),
        &<String as Reflect>::descriptor(),
        &ReflectSettings::new(),
    )
    .unwrap();

    assert!(schema.extensions.is_empty());
}

#[test]
fn Pipeline___caller_steps___run_in_registration_order() {
    let settings = ReflectSettings::new()
        .with_customizer(customizer_fn(|_, schema| {
            schema.description = Some("first".into());
            Ok(ControlFlow::Continue(()))
        }))
        .with_customizers([Arc::new(customizer_fn(|_, schema: &mut Schema| {
            let previous = schema.description.take().unwrap_or_default();
            schema.description = Some(format!("{previous} second"));
            Ok(ControlFlow::Continue(()))
        })) as Arc<dyn SchemaCustomizer>]);

    let schema = run(&Invoice::descriptor(), &Line::descriptor(), &settings).unwrap();

    assert_eq!(schema.description.as_deref(), Some("first second"));
}

#[test]
fn Pipeline___caller_steps___see_stamped_id() {
    let settings = ReflectSettings::new().with_customizer(customizer_fn(|_, schema| {
        schema.description = schema.id().map(str::to_string);
        Ok(ControlFlow::Continue(()))
    }));

    let schema = run(&Invoice::descriptor(), &Line::descriptor(), &settings).unwrap();

    assert_eq!(schema.description.as_deref(), Some("billing.Line"));
}

#[test]
fn Pipeline___mapper_hit___stops_before_required() {
    let settings = ReflectSettings::new().with_mapper(|_| Some(Schema::of_type("string")));

    let schema = run(&Invoice::descriptor(), &Line::descriptor(), &settings).unwrap();

    assert_eq!(schema, Schema::of_type("string"));
}

#[test]
fn Pipeline___mapper_miss___continues_to_required() {
    let settings = ReflectSettings::new().with_mapper(|_| None);

    let schema = run(&Invoice::descriptor(), &Line::descriptor(), &settings).unwrap();

    assert_eq!(schema.required, vec!["amount"]);
}

#[test]
fn Pipeline___failing_step___wraps_type_and_field() {
    let settings = ReflectSettings::new().with_customizer(customizer_fn(|_, _| {
        Err(ExposeError::other("denied"))
    }));

    let err = run(&Invoice::descriptor(), &Line::descriptor(), &settings).unwrap_err();

    assert_eq!(
        err.to_string(),
        "customizer failed for billing::Line (field field): denied"
    );
}

#[test]
fn MarkRequired___non_struct___adds_nothing() {
    let schema = run(
        &Invoice::descriptor(),
        &<Vec<Line> as Reflect>::descriptor(),
        &ReflectSettings::new(),
    )
    .unwrap();

    assert!(schema.required.is_empty());
}

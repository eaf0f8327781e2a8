#![allow(non_snake_case)]

use super::*;
use crate::function::Void;
use expose_core::{Primitive, Reflect, TypeKind};
use serde_json::json;

// Fixtures: hand written equivalents of `#[derive(Expose)]` output

fn downcast<T: 'static>(receiver: &(dyn Any + Send + Sync)) -> ExposeResult<&T> {
    receiver
        .downcast_ref::<T>()
        .ok_or_else(|| ExposeError::Internal("unexpected receiver".to_string()))
}

struct Counter {
    value: i32,
}

impl Counter {
    fn get<'a>(
        receiver: &'a (dyn Any + Send + Sync),
        _ctx: Context,
        _request: Value,
    ) -> BoxFuture<'a, ExposeResult<Value>> {
        Box::pin(async move { Ok(json!(downcast::<Counter>(receiver)?.value)) })
    }

    fn add<'a>(
        receiver: &'a (dyn Any + Send + Sync),
        _ctx: Context,
        request: Value,
    ) -> BoxFuture<'a, ExposeResult<Value>> {
        Box::pin(async move {
            let delta: i32 = serde_json::from_value(request)?;
            Ok(json!(downcast::<Counter>(receiver)?.value + delta))
        })
    }
}

impl Traverse for Counter {
    fn node(&self) -> Node<'_> {
        Node::Value(self)
    }
}

impl Exposable for Counter {
    fn type_name(&self) -> &'static str {
        "Counter"
    }

    fn methods(&self) -> Vec<Method> {
        vec![Method::new("get", Void::descriptor, i32::descriptor, Counter::get)]
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::new("value", true, self.value.node())]
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

/// Counter with two methods
struct Adder {
    base: Counter,
}

impl Traverse for Adder {
    fn node(&self) -> Node<'_> {
        Node::Value(self)
    }
}

impl Exposable for Adder {
    fn type_name(&self) -> &'static str {
        "Adder"
    }

    fn methods(&self) -> Vec<Method> {
        vec![
            Method::new("get_value", Void::descriptor, i32::descriptor, Counter::get),
            Method::new("add", i32::descriptor, i32::descriptor, Counter::add),
            Method::new("add", Void::descriptor, Void::descriptor, Counter::get),
        ]
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::new("base", false, self.base.node())]
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &self.base
    }
}

struct Application {
    secret: Counter,
    user_counter: Counter,
    missing: Option<Box<Counter>>,
    shared: Arc<dyn Exposable>,
    title: String,
}

impl Exposable for Application {
    fn type_name(&self) -> &'static str {
        "Application"
    }

    fn methods(&self) -> Vec<Method> {
        Vec::new()
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![
            Field::new("secret", false, self.secret.node()),
            Field::new("user_counter", true, self.user_counter.node()),
            Field::new("missing", true, self.missing.node()),
            Field::new("shared", true, self.shared.node()),
            Field::new("title", true, self.title.node()),
        ]
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

fn application() -> Arc<Application> {
    Arc::new(Application {
        secret: Counter { value: -1 },
        user_counter: Counter { value: 1 },
        missing: None,
        shared: Arc::new(Adder {
            base: Counter { value: 10 },
        }),
        title: "app".to_string(),
    })
}

fn paths(functions: &[Function]) -> Vec<&str> {
    functions.iter().map(Function::path).collect()
}

// Traverse tests

#[test]
fn Traverse___option_none___is_nil() {
    let missing: Option<Box<Counter>> = None;

    assert!(matches!(missing.node(), Node::Nil));
}

#[test]
fn Traverse___pointers___are_looked_through() {
    let counter = Some(Arc::new(Box::new(Counter { value: 3 })));

    let Node::Value(value) = counter.node() else {
        panic!("expected a value");
    };
    assert_eq!(value.type_name(), "Counter");
}

#[test]
fn Traverse___trait_object___unwraps_to_concrete_value() {
    let shared: Arc<dyn Exposable> = Arc::new(Counter { value: 3 });

    let Node::Value(value) = shared.node() else {
        panic!("expected a value");
    };
    assert_eq!(value.type_name(), "Counter");
}

#[test]
fn Traverse___scalars_and_collections___are_leaves() {
    assert!(matches!(5_i32.node(), Node::Leaf));
    assert!(matches!(String::new().node(), Node::Leaf));
    assert!(matches!(vec![Counter { value: 1 }].node(), Node::Leaf));
}

// discover tests

#[test]
fn discover___single_method___mounts_at_base_path() {
    let counter = Arc::new(Counter { value: 0 });

    let functions = discover("/counter", counter, FunctionSettings::new()).unwrap();

    assert_eq!(paths(&functions), vec!["/counter"]);
    assert_eq!(functions[0].name(), "get");
    assert_eq!(functions[0].operation_id(), "#get");
    assert!(functions[0].is_nullary());
}

#[test]
fn discover___two_methods___mounts_each_under_kebab_case_name() {
    let adder = Adder {
        base: Counter { value: 0 },
    };

    let functions = discover("/adder", Arc::new(adder), FunctionSettings::new()).unwrap();

    assert_eq!(paths(&functions), vec!["/adder/get-value", "/adder/add"]);
    assert_eq!(functions[1].operation_id(), "adder#add");
}

#[test]
fn discover___duplicate_method_names___keep_first() {
    let adder = Adder {
        base: Counter { value: 0 },
    };

    let functions = discover("/adder", Arc::new(adder), FunctionSettings::new()).unwrap();

    let add = &functions[1];
    assert!(matches!(
        add.request().kind,
        TypeKind::Primitive(Primitive::I32)
    ));
}

#[test]
fn discover___nested_fields___descends_exported_values() {
    let functions = discover("/app", application(), FunctionSettings::new()).unwrap();

    assert_eq!(
        paths(&functions),
        vec![
            "/app/user-counter",
            "/app/shared/get-value",
            "/app/shared/add"
        ]
    );
    assert_eq!(functions[0].module(), "app");
    assert_eq!(functions[1].module(), "app.shared");
}

#[test]
fn discover___private_fields___are_skipped() {
    let adder = Adder {
        base: Counter { value: 0 },
    };

    let functions = discover("/adder", Arc::new(adder), FunctionSettings::new()).unwrap();

    assert!(!paths(&functions).iter().any(|path| path.contains("base")));
}

#[test]
fn discover___trailing_slash___is_not_doubled() {
    let functions = discover("/app/", application(), FunctionSettings::new()).unwrap();

    assert_eq!(functions[0].path(), "/app/user-counter");
}

#[test]
fn discover___settings___apply_to_every_endpoint() {
    let functions = discover("/app", application(), FunctionSettings::new().validate(true)).unwrap();

    assert!(functions.iter().all(|function| function.settings().validate));
}

struct Clash {
    get: Counter,
}

impl Exposable for Clash {
    fn type_name(&self) -> &'static str {
        "Clash"
    }

    fn methods(&self) -> Vec<Method> {
        vec![
            Method::new("get", Void::descriptor, i32::descriptor, Counter::get),
            Method::new("set", i32::descriptor, i32::descriptor, Counter::add),
        ]
    }

    fn fields(&self) -> Vec<Field<'_>> {
        vec![Field::new("get", true, self.get.node())]
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        &self.get
    }
}

#[test]
fn discover___field_and_method_on_same_path___fails() {
    let clash = Clash {
        get: Counter { value: 0 },
    };

    let err = discover("/clash", Arc::new(clash), FunctionSettings::new()).unwrap_err();

    assert!(matches!(err, ExposeError::DuplicatePath(ref path) if path == "/clash/get"));
}

// invocation tests

#[tokio::test]
async fn discovered___call___resolves_nested_receiver() {
    let functions = discover("/app", application(), FunctionSettings::new()).unwrap();

    let result = functions[0].call(Context::default(), Value::Null).await.unwrap();

    assert_eq!(result, json!(1));
}

#[tokio::test]
async fn discovered___call_with_request___passes_decoded_value() {
    let functions = discover("/app", application(), FunctionSettings::new()).unwrap();
    let add = functions
        .iter()
        .find(|function| function.path() == "/app/shared/add")
        .unwrap();

    let result = add.call(Context::default(), json!(5)).await.unwrap();

    assert_eq!(result, json!(15));
}

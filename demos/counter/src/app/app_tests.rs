#![allow(non_snake_case)]

use super::*;
use serde_json::json;

fn counter() -> Counter {
    Arc::new(AtomicI32::new(0))
}

#[test]
fn Application___discover___mounts_one_endpoint_per_handler() {
    let counter = counter();

    let functions = discover("/app", Arc::new(Application::new(&counter)), FunctionSettings::new())
        .unwrap();

    let paths: Vec<&str> = functions.iter().map(Function::path).collect();
    assert_eq!(paths, vec!["/app/commands/inc", "/app/queries/count"]);
    assert_eq!(functions[0].operation_id(), "app.commands#handle");
}

#[tokio::test]
async fn functions___inc_then_get___returns_incremented_value() {
    let counter = counter();
    let functions = functions(&counter);

    let incremented = functions[0].call(Context::default(), json!(3)).await.unwrap();
    let current = functions[1].call(Context::default(), json!(null)).await.unwrap();

    assert_eq!(incremented, json!(3));
    assert_eq!(current, json!(3));
}

#[tokio::test]
async fn IncHandler___default_step___adds_one() {
    let counter = counter();
    let functions = discover("/app", Arc::new(Application::new(&counter)), FunctionSettings::new())
        .unwrap();

    functions[0].call(Context::default(), json!({})).await.unwrap();
    let count = functions[1].call(Context::default(), json!(null)).await.unwrap();

    assert_eq!(count, json!(1));
}

#[tokio::test]
async fn IncHandler___negative_step___is_rejected() {
    let counter = counter();
    let functions = discover("/app", Arc::new(Application::new(&counter)), FunctionSettings::new())
        .unwrap();

    let err = functions[0]
        .call(Context::default(), json!({"by": -2}))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "step must be positive, got -2");
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn functions___inc_past_max___fails_and_keeps_value() {
    let counter = Arc::new(AtomicI32::new(i32::MAX));
    let functions = functions(&counter);

    let err = functions[0].call(Context::default(), json!(1)).await.unwrap_err();

    assert_eq!(err.to_string(), "adding 1 would overflow the counter");
    assert_eq!(counter.load(Ordering::SeqCst), i32::MAX);
}

#[tokio::test]
async fn IncHandler___step_past_max___is_rejected() {
    let counter = Arc::new(AtomicI32::new(i32::MAX - 1));
    let functions = discover("/app", Arc::new(Application::new(&counter)), FunctionSettings::new())
        .unwrap();

    let err = functions[0]
        .call(Context::default(), json!({"by": 2}))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "adding 2 would overflow the counter");
    assert_eq!(counter.load(Ordering::SeqCst), i32::MAX - 1);
}

//! Counter endpoints, as free functions and as a service struct

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use expose::prelude::*;

/// Shared counter state
pub type Counter = Arc<AtomicI32>;

#[derive(Debug, thiserror::Error)]
pub enum CounterError {
    #[error("step must be positive, got {0}")]
    InvalidStep(i32),
    #[error("adding {0} would overflow the counter")]
    Overflow(i32),
}

/// Add `delta` and return the new value; the counter is left unchanged on overflow
fn add(counter: &AtomicI32, delta: i32) -> Result<i32, CounterError> {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
            current.checked_add(delta)
        })
        .map(|previous| previous.wrapping_add(delta))
        .map_err(|_| CounterError::Overflow(delta))
}

/// Increment request
#[derive(Debug, Serialize, Deserialize, Reflect)]
pub struct Step {
    /// Amount to add, defaults to 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub by: Option<i32>,
}

/// `/counter/inc` and `/counter/get`
pub fn functions(counter: &Counter) -> Vec<Function> {
    let inc = Arc::clone(counter);
    let get = Arc::clone(counter);

    vec![
        func("/counter/inc", move |_ctx: Context, delta: i32| {
            let counter = Arc::clone(&inc);
            async move { add(&counter, delta) }
        }),
        func_nullary("/counter/get", move |_ctx: Context| {
            let counter = Arc::clone(&get);
            async move { Ok::<_, CounterError>(counter.load(Ordering::SeqCst)) }
        }),
    ]
}

#[derive(Expose)]
pub struct Application {
    pub commands: Commands,
    pub queries: Queries,
}

impl Application {
    pub fn new(counter: &Counter) -> Self {
        Self {
            commands: Commands {
                inc: IncHandler {
                    counter: Arc::clone(counter),
                },
            },
            queries: Queries {
                count: CountQueryHandler {
                    counter: Arc::clone(counter),
                },
            },
        }
    }
}

#[derive(Expose)]
pub struct Commands {
    pub inc: IncHandler,
}

#[derive(Expose)]
pub struct IncHandler {
    counter: Counter,
}

#[exposed]
impl IncHandler {
    pub fn handle(&self, ctx: Context, step: Step) -> Result<(), CounterError> {
        let by = step.by.unwrap_or(1);
        if by <= 0 {
            return Err(CounterError::InvalidStep(by));
        }
        let value = add(&self.counter, by)?;
        tracing::debug!(path = %ctx.path, value, "counter incremented");
        Ok(())
    }
}

#[derive(Expose)]
pub struct Queries {
    pub count: CountQueryHandler,
}

#[derive(Expose)]
pub struct CountQueryHandler {
    counter: Counter,
}

#[exposed]
impl CountQueryHandler {
    pub async fn handle(&self, _ctx: Context) -> Result<i32, CounterError> {
        Ok(self.counter.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
#[path = "app/app_tests.rs"]
mod app_tests;

//! Exposed functions
//!
//! A [`Function`] pairs a mount point with the request/response descriptors used for the
//! openapi document and a type erased handler used to serve calls.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use expose_core::{BoxError, ExposeError, ExposeResult, Reflect, TypeDescriptor};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::context::Context;

/// Boxed future returned by type erased handlers
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Placeholder for a missing request or response
///
/// A function taking `Void` is nullary and gets no request body. A function returning `Void`
/// answers with an empty body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Void;

impl Reflect for Void {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::structure::<Void>("Void", "expose", Vec::new())
    }
}

impl Serialize for Void {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0)).and_then(serde::ser::SerializeMap::end)
    }
}

impl<'de> Deserialize<'de> for Void {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Void)
    }
}

/// Type erased call entry of a [`Function`]
#[async_trait]
pub trait Invoke: Send + Sync {
    async fn invoke(&self, ctx: Context, request: Value) -> ExposeResult<Value>;
}

struct FnInvoker<F>(F);

#[async_trait]
impl<F> Invoke for FnInvoker<F>
where
    F: Fn(Context, Value) -> BoxFuture<'static, ExposeResult<Value>> + Send + Sync,
{
    async fn invoke(&self, ctx: Context, request: Value) -> ExposeResult<Value> {
        (self.0)(ctx, request).await
    }
}

/// Per function options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionSettings {
    /// Validate requests against the request schema before calling
    pub validate: bool,
}

impl FunctionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
}

/// An endpoint registered at a path
#[derive(Clone)]
pub struct Function {
    name: String,
    path: String,
    request: TypeDescriptor,
    response: TypeDescriptor,
    settings: FunctionSettings,
    handler: Arc<dyn Invoke>,
}

impl Function {
    /// Create a function from an already type erased handler
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        request: TypeDescriptor,
        response: TypeDescriptor,
        handler: Arc<dyn Invoke>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            request,
            response,
            settings: FunctionSettings::default(),
            handler,
        }
    }

    /// Name of the function, part of the operation id
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Parent path with `/` replaced by `.`, e.g. `counter` for `/counter/inc`
    pub fn module(&self) -> String {
        match self.path.rfind('/') {
            Some(index) => self.path[..index]
                .replace('/', ".")
                .trim_start_matches('.')
                .to_string(),
            None => String::new(),
        }
    }

    /// `<module>#<name>`
    pub fn operation_id(&self) -> String {
        format!("{}#{}", self.module(), self.name)
    }

    pub fn request(&self) -> &TypeDescriptor {
        &self.request
    }

    pub fn response(&self) -> &TypeDescriptor {
        &self.response
    }

    pub fn settings(&self) -> FunctionSettings {
        self.settings
    }

    /// Whether the function takes no request
    pub fn is_nullary(&self) -> bool {
        self.request.is::<Void>()
    }

    /// Whether the function returns nothing
    pub fn is_void(&self) -> bool {
        self.response.is::<Void>()
    }

    pub fn with_settings(mut self, settings: FunctionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Enable request validation for this function
    pub fn validate(mut self, validate: bool) -> Self {
        self.settings.validate = validate;
        self
    }

    /// Call the function with a decoded request
    ///
    /// Nullary functions ignore `request`.
    pub async fn call(&self, ctx: Context, request: Value) -> ExposeResult<Value> {
        self.handler.invoke(ctx, request).await
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("request", &self.request)
            .field("response", &self.response)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Decode a request value into the argument type of a function
pub fn decode_request<Req: DeserializeOwned>(request: Value) -> ExposeResult<Req> {
    serde_json::from_value(request).map_err(Into::into)
}

/// Encode the result of a function
pub fn encode_response<Res: Serialize + 'static>(response: &Res) -> ExposeResult<Value> {
    if (response as &dyn std::any::Any).is::<Void>() {
        return Ok(Value::Null);
    }
    serde_json::to_value(response).map_err(Into::into)
}

fn last_segment(mountpoint: &str) -> &str {
    mountpoint.rsplit('/').next().unwrap_or(mountpoint)
}

fn erased<Req, Res, E, F, Fut>(mountpoint: &str, f: F) -> Function
where
    Req: Reflect + DeserializeOwned + Send + 'static,
    Res: Reflect + Serialize + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
{
    let f = Arc::new(f);
    let handler = FnInvoker(
        move |ctx: Context, request: Value| -> BoxFuture<'static, ExposeResult<Value>> {
            let f = Arc::clone(&f);
            Box::pin(async move {
                let request: Req = decode_request(request)?;
                let response = f(ctx, request).await.map_err(ExposeError::handler)?;
                encode_response(&response)
            })
        },
    );

    Function::new(
        last_segment(mountpoint),
        mountpoint,
        Req::descriptor(),
        Res::descriptor(),
        Arc::new(handler),
    )
}

/// Expose `f` at `mountpoint`
///
/// The name of the function is the last segment of the mount point.
///
/// # Example
///
/// ```ignore
/// let inc = func("/counter/inc", |_ctx, delta: i32| async move {
///     Ok::<_, std::io::Error>(delta + 1)
/// });
/// assert_eq!(inc.operation_id(), "counter#inc");
/// ```
pub fn func<Req, Res, E, F, Fut>(mountpoint: &str, f: F) -> Function
where
    Req: Reflect + DeserializeOwned + Send + 'static,
    Res: Reflect + Serialize + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
{
    erased(mountpoint, f)
}

/// Expose a function without a result
pub fn func_void<Req, E, F, Fut>(mountpoint: &str, f: F) -> Function
where
    Req: Reflect + DeserializeOwned + Send + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    let f = Arc::new(f);
    erased(mountpoint, move |ctx: Context, request: Req| {
        let call = f(ctx, request);
        async move { call.await.map(|()| Void) }
    })
}

/// Expose a function without a request
pub fn func_nullary<Res, E, F, Fut>(mountpoint: &str, f: F) -> Function
where
    Res: Reflect + Serialize + 'static,
    E: Into<BoxError> + 'static,
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Res, E>> + Send + 'static,
{
    erased(mountpoint, move |ctx: Context, _: Void| f(ctx))
}

/// Expose a function without request and result
pub fn func_nullary_void<E, F, Fut>(mountpoint: &str, f: F) -> Function
where
    E: Into<BoxError> + 'static,
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
{
    erased(mountpoint, move |ctx: Context, _: Void| {
        let call = f(ctx);
        async move { call.await.map(|()| Void) }
    })
}

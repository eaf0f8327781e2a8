//! Endpoint discovery
//!
//! [`discover`] walks an object graph and turns the exported methods of every reachable value
//! into a [`Function`]. Values take part through [`Exposable`], usually derived with
//! `#[derive(Expose)]` and an `#[exposed]` impl block.

use std::any::Any;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::sync::Arc;

use async_trait::async_trait;
use expose_core::{DescriptorFn, ExposeError, ExposeResult};
use heck::ToKebabCase;
use serde_json::Value;
use tracing::info;

use crate::context::Context;
use crate::function::{BoxFuture, Function, FunctionSettings, Invoke};

/// Type erased method entry: downcasts the receiver, decodes, calls and encodes
pub type MethodFn = for<'a> fn(
    &'a (dyn Any + Send + Sync),
    Context,
    Value,
) -> BoxFuture<'a, ExposeResult<Value>>;

/// An exported method of an [`Exposable`] value
#[derive(Clone, Copy)]
pub struct Method {
    pub name: &'static str,
    /// Request descriptor, `Void` for nullary methods
    pub request: DescriptorFn,
    /// Response descriptor, `Void` for methods without a result
    pub response: DescriptorFn,
    pub call: MethodFn,
}

impl Method {
    pub fn new(
        name: &'static str,
        request: DescriptorFn,
        response: DescriptorFn,
        call: MethodFn,
    ) -> Self {
        Self {
            name,
            request,
            response,
            call,
        }
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish()
    }
}

/// A value whose methods and fields can be discovered
pub trait Exposable: Send + Sync + 'static {
    /// Type name, for diagnostics
    fn type_name(&self) -> &'static str;

    /// Exported methods in declaration order
    fn methods(&self) -> Vec<Method>;

    /// All fields in declaration order, exported or not
    ///
    /// Discovered endpoints address nested receivers by field index, so the order must be
    /// stable.
    fn fields(&self) -> Vec<Field<'_>>;

    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

/// A field of an [`Exposable`] value
#[derive(Clone, Copy)]
pub struct Field<'a> {
    pub name: &'static str,
    /// Whether the field is `pub`; private fields are never descended into
    pub exported: bool,
    pub node: Node<'a>,
}

impl<'a> Field<'a> {
    pub fn new(name: &'static str, exported: bool, node: Node<'a>) -> Self {
        Self {
            name,
            exported,
            node,
        }
    }
}

/// What a field value contributes to discovery
#[derive(Clone, Copy)]
pub enum Node<'a> {
    /// Empty pointer or option, nothing to discover
    Nil,
    Value(&'a dyn Exposable),
    /// A value without methods or fields
    Leaf,
}

/// Maps a field value onto a [`Node`]
///
/// Pointers and options are looked through.
pub trait Traverse {
    fn node(&self) -> Node<'_>;
}

impl Traverse for dyn Exposable {
    fn node(&self) -> Node<'_> {
        Node::Value(self)
    }
}

impl<T: Traverse> Traverse for Option<T> {
    fn node(&self) -> Node<'_> {
        match self {
            Some(value) => value.node(),
            None => Node::Nil,
        }
    }
}

impl<T: ?Sized + Traverse> Traverse for &T {
    fn node(&self) -> Node<'_> {
        (**self).node()
    }
}

macro_rules! impl_deref {
    ($($ptr:ident),*) => {
        $(
            impl<T: ?Sized + Traverse> Traverse for $ptr<T> {
                fn node(&self) -> Node<'_> {
                    (**self).node()
                }
            }
        )*
    };
}

impl_deref!(Box, Arc, Rc);

macro_rules! impl_leaf {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Traverse for $ty {
                fn node(&self) -> Node<'_> {
                    Node::Leaf
                }
            }
        )*
    };
}

impl_leaf!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String, str, Value,
);

impl<T> Traverse for Vec<T> {
    fn node(&self) -> Node<'_> {
        Node::Leaf
    }
}

impl<T> Traverse for VecDeque<T> {
    fn node(&self) -> Node<'_> {
        Node::Leaf
    }
}

impl<T> Traverse for BTreeSet<T> {
    fn node(&self) -> Node<'_> {
        Node::Leaf
    }
}

impl<T, S> Traverse for HashSet<T, S> {
    fn node(&self) -> Node<'_> {
        Node::Leaf
    }
}

impl<K, V> Traverse for BTreeMap<K, V> {
    fn node(&self) -> Node<'_> {
        Node::Leaf
    }
}

impl<K, V, S> Traverse for HashMap<K, V, S> {
    fn node(&self) -> Node<'_> {
        Node::Leaf
    }
}

/// Discover the endpoints of `root` below `base_path`
///
/// A value with a single exported method is mounted at its own path. A value with several
/// gets one endpoint per method at `<path>/<kebab-case method>`. Exported fields are
/// descended into at `<path>/<kebab-case field>`. Method names are deduplicated keeping the
/// first; two endpoints on the same path fail with [`ExposeError::DuplicatePath`].
pub fn discover<R: Exposable>(
    base_path: &str,
    root: Arc<R>,
    settings: FunctionSettings,
) -> ExposeResult<Vec<Function>> {
    discover_dyn(base_path, root, settings)
}

/// [`discover`] for a type erased root
pub fn discover_dyn(
    base_path: &str,
    root: Arc<dyn Exposable>,
    settings: FunctionSettings,
) -> ExposeResult<Vec<Function>> {
    let mut discovery = Discovery {
        root: Arc::clone(&root),
        settings,
        paths: HashSet::new(),
        functions: Vec::new(),
    };
    discovery.visit(base_path.to_string(), &*root, &mut Vec::new())?;
    Ok(discovery.functions)
}

struct Discovery {
    root: Arc<dyn Exposable>,
    settings: FunctionSettings,
    paths: HashSet<String>,
    functions: Vec<Function>,
}

impl Discovery {
    fn visit(
        &mut self,
        path: String,
        value: &dyn Exposable,
        route: &mut Vec<usize>,
    ) -> ExposeResult<()> {
        let methods = unique_methods(value.methods());
        match methods.as_slice() {
            [] => {}
            [method] => self.register(path.clone(), route, *method)?,
            methods => {
                for method in methods {
                    self.register(join(&path, method.name), route, *method)?;
                }
            }
        }

        for (index, field) in value.fields().into_iter().enumerate() {
            if !field.exported {
                continue;
            }
            if let Node::Value(next) = field.node {
                route.push(index);
                self.visit(join(&path, field.name), next, route)?;
                route.pop();
            }
        }
        Ok(())
    }

    fn register(&mut self, path: String, route: &[usize], method: Method) -> ExposeResult<()> {
        if !self.paths.insert(path.clone()) {
            return Err(ExposeError::DuplicatePath(path));
        }

        let bound = BoundMethod {
            root: Arc::clone(&self.root),
            route: route.to_vec(),
            method,
        };
        let function = Function::new(
            method.name,
            path,
            (method.request)(),
            (method.response)(),
            Arc::new(bound),
        )
        .with_settings(self.settings);

        info!(path = %function.path(), operation = %function.operation_id(), "discovered endpoint");
        self.functions.push(function);
        Ok(())
    }
}

fn unique_methods(methods: Vec<Method>) -> Vec<Method> {
    let mut seen = HashSet::new();
    methods
        .into_iter()
        .filter(|method| seen.insert(method.name))
        .collect()
}

fn join(path: &str, segment: &str) -> String {
    format!("{}/{}", path.trim_end_matches('/'), segment.to_kebab_case())
}

/// A discovered method bound to the root it was found in
struct BoundMethod {
    root: Arc<dyn Exposable>,
    route: Vec<usize>,
    method: Method,
}

impl BoundMethod {
    fn receiver(&self) -> ExposeResult<&dyn Exposable> {
        let mut current: &dyn Exposable = &*self.root;
        for &index in &self.route {
            current = match current.fields().into_iter().nth(index) {
                Some(Field {
                    node: Node::Value(next),
                    ..
                }) => next,
                _ => {
                    return Err(ExposeError::Internal(format!(
                        "receiver of {} is no longer reachable from {}",
                        self.method.name,
                        self.root.type_name()
                    )));
                }
            };
        }
        Ok(current)
    }
}

#[async_trait]
impl Invoke for BoundMethod {
    async fn invoke(&self, ctx: Context, request: Value) -> ExposeResult<Value> {
        let receiver = self.receiver()?;
        (self.method.call)(receiver.as_any(), ctx, request).await
    }
}

#[cfg(test)]
#[path = "discovery/discovery_tests.rs"]
mod discovery_tests;

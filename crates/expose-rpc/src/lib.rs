//! expose-rpc - Endpoint discovery and invocation
//!
//! This crate provides:
//! - [`Function`] and the [`func`] family for exposing free functions
//! - [`discover`] for exposing the methods of an object graph
//! - [`reflect_spec`] for assembling the [`OpenApi`] document
//! - [`Handler`] for routing and decoding calls through a [`Codec`]

mod codec;
mod context;
mod discovery;
mod document;
mod function;
mod handler;

pub use codec::{Codec, CodecError, Codecs, JSON_CONTENT_TYPE, JsonCodec};
pub use context::Context;
pub use discovery::{
    Exposable, Field, Method, MethodFn, Node, Traverse, discover, discover_dyn,
};
pub use document::{
    Components, Info, MediaType, OPENAPI_VERSION, OpenApi, Operation, PathItem, RequestBody,
    Response, Server, reflect_spec,
};
pub use function::{
    BoxFuture, Function, FunctionSettings, Invoke, Void, decode_request, encode_response, func,
    func_nullary, func_nullary_void, func_void,
};
pub use handler::{ErrorBody, Handler, HandlerOptions, Reply};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Context, Exposable, Function, FunctionSettings, Handler, HandlerOptions, OpenApi, Void,
        discover, func, func_nullary, func_nullary_void, func_void, reflect_spec,
    };
}

/// Support code for `#[derive(Expose)]` and `#[exposed]`
#[doc(hidden)]
pub mod __private {
    use std::any::Any;

    use expose_core::{ExposeError, ExposeResult};

    use crate::discovery::{Method, Node, Traverse};

    pub use serde_json::Value;

    /// Receiver of a generated method entry
    pub fn downcast<T: Any>(receiver: &(dyn Any + Send + Sync)) -> ExposeResult<&T> {
        receiver.downcast_ref::<T>().ok_or_else(|| {
            ExposeError::Internal(format!(
                "method receiver is not a {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Fallback for types without any `#[exposed]` block
    pub trait NoExposedMethods {
        fn __exposed_methods() -> Vec<Method> {
            Vec::new()
        }
    }

    impl<T: ?Sized> NoExposedMethods for T {}

    /// Field probe resolving to [`Traverse::node`] when the field type supports it and to
    /// [`Node::Leaf`] otherwise
    pub struct Probe<'a, T: ?Sized>(pub &'a T);

    pub trait ViaTraverse<'a> {
        fn __node(&self) -> Node<'a>;
    }

    impl<'a, T: ?Sized + Traverse> ViaTraverse<'a> for Probe<'a, T> {
        fn __node(&self) -> Node<'a> {
            T::node(self.0)
        }
    }

    pub trait ViaLeaf<'a> {
        fn __node(&self) -> Node<'a>;
    }

    impl<'a, T: ?Sized> ViaLeaf<'a> for &Probe<'a, T> {
        fn __node(&self) -> Node<'a> {
            Node::Leaf
        }
    }
}

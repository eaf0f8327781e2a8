//! expose-macros - Procedural macros for expose
//!
//! This crate provides:
//! - `#[derive(Reflect)]` - Describe a type for schema reflection
//! - `#[derive(Expose)]` - Make a struct traversable by endpoint discovery
//! - `#[exposed]` - Register the eligible methods of an impl block as endpoints

mod attrs;
mod expose;
mod exposed;
mod reflect;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemImpl, parse_macro_input};

/// Derive macro for schema reflection
///
/// Structs with named fields become object schemas, single field tuple structs are described
/// by their inner type and unit-only enums become string enums. serde attributes that change
/// the wire shape (`rename`, `rename_all`, `skip*`, `default`, `flatten`, `transparent`) are
/// honored and doc comments become descriptions.
///
/// # Example
///
/// ```ignore
/// use expose::Reflect;
///
/// /// A registered user
/// #[derive(Reflect, Serialize, Deserialize)]
/// #[serde(rename_all = "camelCase")]
/// struct User {
///     user_name: String,
///     #[serde(skip_serializing_if = "Option::is_none")]
///     email: Option<String>,
/// }
/// ```
///
/// Types describing their own schema implement `SchemaProvider` and opt in with
/// `#[expose(provider)]`.
#[proc_macro_derive(Reflect, attributes(expose))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match reflect::derive_reflect_impl(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.write_errors()),
    }
}

/// Derive macro for endpoint discovery
///
/// Implements `Exposable` and `Traverse`. Discovery descends into `pub` fields; fields marked
/// `#[expose(skip)]` are never descended into.
///
/// # Example
///
/// ```ignore
/// #[derive(Expose)]
/// struct Application {
///     pub users: UserService,
///     pub orders: Arc<OrderService>,
///     #[expose(skip)]
///     pub pool: DbPool,
/// }
/// ```
#[proc_macro_derive(Expose, attributes(expose))]
pub fn derive_expose(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expose::derive_expose_impl(&input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.write_errors()),
    }
}

/// Attribute for registering methods as endpoints
///
/// Every `pub` method with one of the shapes `(&self, ctx)` or `(&self, ctx, req)` returning
/// `Result<R, E>` or `Result<(), E>`, sync or async, is registered. Other methods are left
/// alone; `#[expose(skip)]` excludes an eligible one. Only one `#[exposed]` block is allowed
/// per type.
///
/// # Example
///
/// ```ignore
/// #[exposed]
/// impl UserService {
///     pub async fn get(&self, ctx: Context, id: u64) -> Result<User, ServiceError> {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn exposed(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);

    match exposed::exposed_impl(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.to_compile_error()),
    }
}

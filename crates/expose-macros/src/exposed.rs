//! `#[exposed]` on inherent impl blocks

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::{
    Attribute, FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, PathArguments, ReturnType,
    Type, Visibility,
};

/// Signature of an exposable method
#[derive(Debug)]
pub struct Shape {
    pub ident: syn::Ident,
    /// `None` for `(ctx)` methods
    pub request: Option<Type>,
    /// `None` for methods returning `Result<(), E>`
    pub response: Option<Type>,
    pub is_async: bool,
}

/// Check `method` against the exposable shapes
///
/// Eligible methods are `pub`, take `&self`, a `Context` and optionally one request argument,
/// and return a `Result`. Everything else is skipped.
pub fn classify(method: &ImplItemFn) -> Option<Shape> {
    if !matches!(method.vis, Visibility::Public(_)) || !method.sig.generics.params.is_empty() {
        return None;
    }

    let mut inputs = method.sig.inputs.iter();
    match inputs.next()? {
        FnArg::Receiver(receiver)
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => return None,
    }

    let args: Vec<&Type> = inputs
        .map(|arg| match arg {
            FnArg::Typed(typed) => Some(&*typed.ty),
            FnArg::Receiver(_) => None,
        })
        .collect::<Option<_>>()?;

    let request = match args.as_slice() {
        [ctx] if is_context(ctx) => None,
        [ctx, request] if is_context(ctx) => Some((*request).clone()),
        _ => return None,
    };

    let ReturnType::Type(_, output) = &method.sig.output else {
        return None;
    };
    let ok = result_ok_type(output)?;
    let response = match ok {
        Type::Tuple(tuple) if tuple.elems.is_empty() => None,
        ty => Some(ty.clone()),
    };

    Some(Shape {
        ident: method.sig.ident.clone(),
        request,
        response,
        is_async: method.sig.asyncness.is_some(),
    })
}

fn is_context(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Context"),
        _ => false,
    }
}

/// `T` of `Result<T, E>` or of an alias such as `anyhow::Result<T>`
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if !segment.ident.to_string().ends_with("Result") {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first()? {
        GenericArgument::Type(ok) => Some(ok),
        _ => None,
    }
}

/// Strip `#[expose(...)]` from a method, returning whether it asked to be skipped
fn take_expose_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<bool> {
    let mut skip = false;
    let mut result = Ok(());
    attrs.retain(|attr| {
        if !attr.path().is_ident("expose") {
            return true;
        }
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported expose attribute, expected `skip`"))
            }
        });
        if let Err(err) = parsed {
            result = Err(err);
        }
        false
    });
    result.map(|()| skip)
}

pub fn exposed_impl(mut item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[exposed] must be placed on an inherent impl block",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[exposed] does not support generic impl blocks",
        ));
    }

    let mut shapes = Vec::new();
    for impl_item in &mut item.items {
        if let ImplItem::Fn(method) = impl_item {
            let skip = take_expose_attrs(&mut method.attrs)?;
            if skip {
                continue;
            }
            shapes.extend(classify(method));
        }
    }

    let self_ty = &item.self_ty;
    let call_fns = shapes.iter().map(|shape| call_fn(self_ty, shape));
    let entries = shapes.iter().map(method_entry);

    Ok(quote! {
        #item

        impl #self_ty {
            #[doc(hidden)]
            pub fn __exposed_methods() -> ::std::vec::Vec<::expose::Method> {
                #(#call_fns)*
                ::std::vec![#(#entries),*]
            }
        }
    })
}

fn call_fn_ident(shape: &Shape) -> syn::Ident {
    format_ident!("__expose_call_{}", shape.ident.unraw())
}

fn call_fn(self_ty: &Type, shape: &Shape) -> TokenStream {
    let ident = call_fn_ident(shape);
    let method = &shape.ident;
    let awaited = shape.is_async.then(|| quote!(.await));

    let (decode, args) = match &shape.request {
        Some(ty) => (
            quote!(let request: #ty = ::expose::decode_request(request)?;),
            quote!(ctx, request),
        ),
        None => (quote!(let _ = request;), quote!(ctx)),
    };

    let encode = match &shape.response {
        Some(_) => quote!(::expose::encode_response(&response)),
        None => quote! {
            let () = response;
            ::core::result::Result::Ok(::expose::__private::Value::Null)
        },
    };

    quote! {
        fn #ident<'a>(
            receiver: &'a (dyn ::core::any::Any + ::core::marker::Send + ::core::marker::Sync),
            ctx: ::expose::Context,
            request: ::expose::__private::Value,
        ) -> ::expose::BoxFuture<'a, ::expose::ExposeResult<::expose::__private::Value>> {
            ::std::boxed::Box::pin(async move {
                let receiver = ::expose::__private::downcast::<#self_ty>(receiver)?;
                #decode
                let response = receiver
                    .#method(#args)
                    #awaited
                    .map_err(::expose::ExposeError::handler)?;
                #encode
            })
        }
    }
}

fn method_entry(shape: &Shape) -> TokenStream {
    let name = shape.ident.unraw().to_string();
    let ident = call_fn_ident(shape);
    let request = match &shape.request {
        Some(ty) => quote!(#ty),
        None => quote!(::expose::Void),
    };
    let response = match &shape.response {
        Some(ty) => quote!(#ty),
        None => quote!(::expose::Void),
    };

    quote! {
        ::expose::Method::new(
            #name,
            <#request as ::expose::Reflect>::descriptor,
            <#response as ::expose::Reflect>::descriptor,
            #ident,
        )
    }
}

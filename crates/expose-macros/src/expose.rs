//! `#[derive(Expose)]`

use darling::FromDeriveInput;
use darling::ast::{Data, Style};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

use crate::attrs::ContainerOpts;

pub fn derive_expose_impl(input: &DeriveInput) -> darling::Result<TokenStream> {
    let opts = ContainerOpts::from_derive_input(input)?;
    let ident = &opts.ident;

    if !opts.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &opts.generics,
            "Expose cannot be derived for generic types",
        )
        .into());
    }

    let fields = match &opts.data {
        Data::Struct(fields) if matches!(fields.style, Style::Struct | Style::Unit) => {
            &fields.fields
        }
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "Expose can only be derived for structs with named fields",
            )
            .into());
        }
    };

    let entries = fields.iter().filter_map(|field| {
        let member = field.ident.as_ref()?;
        let name = field.name()?;
        let exported = field.is_exported();
        let node = if field.skip {
            quote!(::expose::Node::Leaf)
        } else {
            quote!((&::expose::__private::Probe(&self.#member)).__node())
        };
        Some(quote!(::expose::Field::new(#name, #exported, #node)))
    });

    Ok(quote! {
        impl ::expose::Traverse for #ident {
            fn node(&self) -> ::expose::Node<'_> {
                ::expose::Node::Value(self)
            }
        }

        impl ::expose::Exposable for #ident {
            fn type_name(&self) -> &'static str {
                ::core::any::type_name::<Self>()
            }

            fn methods(&self) -> ::std::vec::Vec<::expose::Method> {
                #[allow(unused_imports)]
                use ::expose::__private::NoExposedMethods as _;
                Self::__exposed_methods()
            }

            fn fields(&self) -> ::std::vec::Vec<::expose::Field<'_>> {
                #[allow(unused_imports)]
                use ::expose::__private::{ViaLeaf as _, ViaTraverse as _};
                ::std::vec![#(#entries),*]
            }

            fn as_any(&self) -> &(dyn ::core::any::Any + ::core::marker::Send + ::core::marker::Sync) {
                self
            }
        }
    })
}

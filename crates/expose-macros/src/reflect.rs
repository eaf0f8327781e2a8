//! `#[derive(Reflect)]`

use darling::FromDeriveInput;
use darling::ast::{Data, Style};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, GenericParam, parse_quote};

use crate::attrs::{ContainerOpts, FieldOpts, SerdeContainer, SerdeField, VariantOpts, docs};

pub fn derive_reflect_impl(input: &DeriveInput) -> darling::Result<TokenStream> {
    let opts = ContainerOpts::from_derive_input(input)?;
    let serde = SerdeContainer::from_attrs(&opts.attrs)?;

    if let Some(lifetime) = opts.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Reflect cannot be derived for types with lifetime parameters",
        )
        .into());
    }

    let ident = &opts.ident;
    let mut generics = opts.generics.clone();
    let mut type_args = Vec::new();
    for param in &mut generics.params {
        if let GenericParam::Type(param) = param {
            param.bounds.push(parse_quote!(::expose::Reflect));
            let arg = &param.ident;
            type_args.push(quote!(<#arg as ::expose::Reflect>::descriptor()));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let base_name = opts.name.clone().unwrap_or_else(|| ident.to_string());
    let (name, bind_args, with_args) = if type_args.is_empty() {
        (quote!(#base_name), None, None)
    } else {
        (
            quote!(::expose::generic_name(#base_name, &type_args)),
            Some(quote!(let type_args = ::std::vec![#(#type_args),*];)),
            Some(quote!(.with_type_args(#base_name, type_args))),
        )
    };

    let body = if opts.provider {
        quote! {
            ::expose::TypeDescriptor::structure::<Self>(
                #name,
                ::core::module_path!(),
                ::std::vec::Vec::new(),
            )
            .with_provider(<Self as ::expose::SchemaProvider>::schema)
        }
    } else {
        match &opts.data {
            Data::Enum(variants) => enumeration(&name, variants, &serde)?,
            Data::Struct(fields) => match fields.style {
                Style::Tuple => {
                    let inner = &fields.fields[0].ty;
                    quote! {
                        ::expose::TypeDescriptor::newtype::<Self>(
                            #name,
                            ::core::module_path!(),
                            <#inner as ::expose::Reflect>::descriptor,
                        )
                    }
                }
                Style::Struct if serde.transparent && fields.fields.len() == 1 => {
                    let inner = &fields.fields[0].ty;
                    quote! {
                        ::expose::TypeDescriptor::newtype::<Self>(
                            #name,
                            ::core::module_path!(),
                            <#inner as ::expose::Reflect>::descriptor,
                        )
                    }
                }
                Style::Struct | Style::Unit => {
                    let fields = fields
                        .fields
                        .iter()
                        .map(|field| field_descriptor(field, &serde))
                        .collect::<syn::Result<Vec<_>>>()?;
                    quote! {
                        ::expose::TypeDescriptor::structure::<Self>(
                            #name,
                            ::core::module_path!(),
                            ::std::vec![#(#fields),*],
                        )
                    }
                }
            },
        }
    };

    let docs = docs(&opts.attrs).map(|docs| quote!(.with_docs(#docs)));

    Ok(quote! {
        impl #impl_generics ::expose::Reflect for #ident #ty_generics #where_clause {
            fn descriptor() -> ::expose::TypeDescriptor {
                #bind_args
                #body #with_args #docs
            }
        }
    })
}

fn enumeration(
    name: &TokenStream,
    variants: &[VariantOpts],
    container: &SerdeContainer,
) -> syn::Result<TokenStream> {
    let mut names = Vec::new();
    for variant in variants {
        let serde = SerdeField::from_attrs(&variant.attrs)?;
        if variant.skip || serde.skip {
            continue;
        }
        let ident = variant.ident.to_string();
        let resolved = match (serde.rename, container.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => rule.apply(&ident),
            (None, None) => ident,
        };
        names.push(resolved);
    }

    Ok(quote! {
        ::expose::TypeDescriptor::enumeration::<Self>(
            #name,
            ::core::module_path!(),
            ::std::vec![#(::std::borrow::Cow::Borrowed(#names)),*],
        )
    })
}

fn field_descriptor(field: &FieldOpts, container: &SerdeContainer) -> syn::Result<TokenStream> {
    let Some(name) = field.name() else {
        return Err(syn::Error::new_spanned(&field.ty, "expected a named field"));
    };
    let serde = SerdeField::from_attrs(&field.attrs)?;

    if field.skip || serde.skip {
        return Ok(quote!(::expose::FieldDescriptor::skipped(#name)));
    }

    let ty = &field.ty;
    let mut tag = Vec::new();
    let renamed = match (field.rename.clone().or(serde.rename), container.rename_all) {
        (Some(rename), _) => Some(rename),
        (None, Some(rule)) => Some(rule.apply(&name)).filter(|renamed| *renamed != name),
        (None, None) => None,
    };
    if let Some(rename) = renamed {
        tag.push(quote!(.with_rename(#rename)));
    }
    if serde.omit_empty || field.omit_empty {
        tag.push(quote!(.omit_empty()));
    }
    if serde.flatten || field.flatten {
        tag.push(quote!(.flatten()));
    }

    let tag = (!tag.is_empty())
        .then(|| quote!(.with_tag(::expose::FieldTag::default() #(#tag)*)));
    let docs = docs(&field.attrs).map(|docs| quote!(.with_docs(#docs)));

    Ok(quote! {
        ::expose::FieldDescriptor::new(#name, <#ty as ::expose::Reflect>::descriptor)
            #tag
            #docs
    })
}

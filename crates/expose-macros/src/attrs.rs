//! Attribute parsing shared by the derives

use darling::{FromDeriveInput, FromField, FromVariant};
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, ExprLit, Lit, LitStr, Meta, Token};

/// Container options: `#[expose(provider)]`, `#[expose(name = "...")]`
#[derive(Debug, FromDeriveInput)]
#[darling(
    attributes(expose),
    forward_attrs(doc, serde),
    supports(struct_named, struct_newtype, struct_unit, enum_unit)
)]
pub struct ContainerOpts {
    pub ident: syn::Ident,
    pub generics: syn::Generics,
    pub attrs: Vec<Attribute>,
    pub data: darling::ast::Data<VariantOpts, FieldOpts>,

    /// Schema comes from the `SchemaProvider` impl of the type
    #[darling(default)]
    pub provider: bool,

    /// Schema name, defaults to the type name
    #[darling(default)]
    pub name: Option<String>,
}

/// Field options: `#[expose(skip)]`, `#[expose(rename = "...", omit_empty, flatten)]`
#[derive(Debug, FromField)]
#[darling(attributes(expose), forward_attrs(doc, serde))]
pub struct FieldOpts {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,
    pub vis: syn::Visibility,
    pub attrs: Vec<Attribute>,

    /// Leave the field out of schemas and discovery
    #[darling(default)]
    pub skip: bool,

    /// Property name; takes precedence over serde `rename`
    #[darling(default)]
    pub rename: Option<String>,

    #[darling(default)]
    pub omit_empty: bool,

    #[darling(default)]
    pub flatten: bool,
}

impl FieldOpts {
    /// Field name as written, without `r#`
    pub fn name(&self) -> Option<String> {
        self.ident.as_ref().map(|ident| ident.unraw().to_string())
    }

    pub fn is_exported(&self) -> bool {
        matches!(self.vis, syn::Visibility::Public(_))
    }
}

#[derive(Debug, FromVariant)]
#[darling(attributes(expose), forward_attrs(doc, serde))]
pub struct VariantOpts {
    pub ident: syn::Ident,
    pub attrs: Vec<Attribute>,

    #[darling(default)]
    pub skip: bool,
}

/// serde container attributes that change the wire shape
#[derive(Debug, Default, PartialEq)]
pub struct SerdeContainer {
    pub rename_all: Option<RenameRule>,
    pub transparent: bool,
}

impl SerdeContainer {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut container = Self::default();
        for attr in serde_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename_all") {
                    if let Some(rule) = serialize_value(&meta)? {
                        container.rename_all = Some(RenameRule::parse(&rule)?);
                    }
                } else if meta.path.is_ident("transparent") {
                    container.transparent = true;
                } else {
                    skip_meta_value(&meta)?;
                }
                Ok(())
            })?;
        }
        Ok(container)
    }
}

/// serde field/variant attributes that change the wire shape
#[derive(Debug, Default, PartialEq)]
pub struct SerdeField {
    pub rename: Option<String>,
    pub skip: bool,
    pub omit_empty: bool,
    pub flatten: bool,
}

impl SerdeField {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut field = Self::default();
        for attr in serde_attrs(attrs) {
            attr.parse_nested_meta(|meta| {
                let path = &meta.path;
                if path.is_ident("rename") {
                    if let Some(rename) = serialize_value(&meta)? {
                        field.rename = Some(rename.value());
                    }
                } else if path.is_ident("skip")
                    || path.is_ident("skip_serializing")
                    || path.is_ident("skip_deserializing")
                {
                    field.skip = true;
                } else if path.is_ident("skip_serializing_if") || path.is_ident("default") {
                    field.omit_empty = true;
                    skip_meta_value(&meta)?;
                } else if path.is_ident("flatten") {
                    field.flatten = true;
                } else {
                    skip_meta_value(&meta)?;
                }
                Ok(())
            })?;
        }
        Ok(field)
    }
}

fn serde_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("serde"))
}

/// Value of `key = "..."` or the `serialize` half of `key(serialize = "...", ...)`
fn serialize_value(meta: &ParseNestedMeta<'_>) -> syn::Result<Option<LitStr>> {
    if meta.input.peek(Token![=]) {
        return meta.value()?.parse().map(Some);
    }

    let mut value = None;
    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("serialize") {
            value = Some(inner.value()?.parse()?);
        } else {
            skip_meta_value(&inner)?;
        }
        Ok(())
    })?;
    Ok(value)
}

fn skip_meta_value(meta: &ParseNestedMeta<'_>) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        let content;
        syn::parenthesized!(content in meta.input);
        content.parse::<proc_macro2::TokenStream>()?;
    }
    Ok(())
}

/// serde `rename_all` rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    Lower,
    Upper,
    Pascal,
    Camel,
    Snake,
    ScreamingSnake,
    Kebab,
    ScreamingKebab,
}

impl RenameRule {
    pub fn parse(rule: &LitStr) -> syn::Result<Self> {
        Ok(match rule.value().as_str() {
            "lowercase" => RenameRule::Lower,
            "UPPERCASE" => RenameRule::Upper,
            "PascalCase" => RenameRule::Pascal,
            "camelCase" => RenameRule::Camel,
            "snake_case" => RenameRule::Snake,
            "SCREAMING_SNAKE_CASE" => RenameRule::ScreamingSnake,
            "kebab-case" => RenameRule::Kebab,
            "SCREAMING-KEBAB-CASE" => RenameRule::ScreamingKebab,
            other => {
                return Err(syn::Error::new(
                    rule.span(),
                    format!("unknown rename rule `{other}`"),
                ));
            }
        })
    }

    /// Apply to a field (snake_case) or variant (PascalCase) name
    pub fn apply(self, name: &str) -> String {
        match self {
            RenameRule::Lower => name.to_ascii_lowercase(),
            RenameRule::Upper => name.to_ascii_uppercase(),
            RenameRule::Pascal => name.to_upper_camel_case(),
            RenameRule::Camel => name.to_lower_camel_case(),
            RenameRule::Snake => name.to_snake_case(),
            RenameRule::ScreamingSnake => name.to_shouty_snake_case(),
            RenameRule::Kebab => name.to_kebab_case(),
            RenameRule::ScreamingKebab => name.to_shouty_kebab_case(),
        }
    }
}

/// Doc comment text, one line per `///`, leading space removed
pub fn docs(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(name_value) => match &name_value.value {
                Expr::Lit(ExprLit {
                    lit: Lit::Str(text),
                    ..
                }) => Some(text.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').unwrap_or(&line).trim_end().to_string())
        .collect();

    let text = lines.join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

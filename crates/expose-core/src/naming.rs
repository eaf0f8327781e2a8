//! Schema identifiers
//!
//! An identifier is a pure function of the type: equal types get equal identifiers and
//! pointers, boxes and optionals are transparent.

use std::sync::Arc;

use crate::descriptor::{TypeDescriptor, TypeKind};

/// Maps a type to its schema table identifier
pub type SchemaIdentifier = Arc<dyn Fn(&TypeDescriptor) -> String + Send + Sync>;

/// `<module.path>.<Name>`, e.g. `my_app.api.users.User`
pub fn default_schema_identifier() -> SchemaIdentifier {
    Arc::new(qualified_name)
}

/// `<module>.<Name>`, e.g. `users.User`
pub fn short_schema_identifier() -> SchemaIdentifier {
    Arc::new(short_name)
}

/// Identifier qualified with the full module path
pub fn qualified_name(ty: &TypeDescriptor) -> String {
    name_with(ty, &|module| module.replace("::", "."))
}

/// Identifier qualified with the last module segment
pub fn short_name(ty: &TypeDescriptor) -> String {
    name_with(ty, &|module| {
        module
            .rsplit("::")
            .next()
            .unwrap_or(module)
            .to_string()
    })
}

fn name_with(ty: &TypeDescriptor, qualifier: &dyn Fn(&str) -> String) -> String {
    match &ty.kind {
        TypeKind::List(elem) => name_with(elem, qualifier) + "List",
        TypeKind::Map(value) => name_with(value, qualifier) + "Map",
        TypeKind::Pointer(inner) | TypeKind::Optional(inner) => name_with(inner, qualifier),
        TypeKind::Dynamic => "any".to_string(),
        _ => {
            let name = match &ty.generic {
                Some(generic) => {
                    let args: Vec<String> = generic
                        .args
                        .iter()
                        .map(|arg| name_with(arg, qualifier))
                        .collect();
                    format!("{}Of{}", generic.base, args.join("And"))
                }
                None => ty.name.to_string(),
            };
            match ty.module_path {
                Some(module) if !module.is_empty() => format!("{}.{name}", qualifier(module)),
                _ => name,
            }
        }
    }
}

/// Display name of a generic type instantiation, e.g. `PageOfUser` or `PairOfStringAndi64`
///
/// Identifiers qualify each argument with its module, see [`qualified_name`].
pub fn generic_name(base: &str, args: &[TypeDescriptor]) -> String {
    if args.is_empty() {
        return base.to_string();
    }
    let args: Vec<&str> = args.iter().map(|arg| arg.deref().name.as_ref()).collect();
    format!("{base}Of{}", args.join("And"))
}

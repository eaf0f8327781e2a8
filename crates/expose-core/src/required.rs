//! Required property analysis

use crate::descriptor::{IGNORE_SENTINEL, OmitPolicy, TypeDescriptor, TypeKind};

/// Names of the properties of `ty` that must be present in a payload
///
/// A field is required unless it is omit-empty or ignored. Flattened fields contribute the
/// required properties of their own type. Fields without annotations keep their declared
/// name. Anything that is not a struct (after stripping pointers) has no required properties.
pub fn required_props(ty: &TypeDescriptor) -> Vec<String> {
    let TypeKind::Struct(fields) = &ty.deref().kind else {
        return Vec::new();
    };

    let mut props = Vec::new();
    for field in fields {
        if field.tag.flatten {
            if let Some(inner) = field.ty {
                props.extend(required_props(&inner()));
            }
            continue;
        }

        if field.tag.is_empty() {
            props.push(field.name.to_string());
            continue;
        }

        if field.tag.omit == OmitPolicy::OmitEmpty {
            continue;
        }

        let name = field.resolved_name();
        if name == IGNORE_SENTINEL {
            continue;
        }

        props.push(name.to_string());
    }
    props
}

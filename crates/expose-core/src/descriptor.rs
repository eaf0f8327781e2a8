//! Runtime type metadata
//!
//! A [`TypeDescriptor`] is the handle the schema builder works on. It is produced by the
//! [`Reflect`] trait, implemented here for the std types and derived for user types.

use std::any::TypeId;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, SyncSender};

use crate::error::ExposeResult;
use crate::generator::Generator;
use crate::schema::{Schema, SchemaRef};

/// Field rename that removes a field from schemas and required sets
pub const IGNORE_SENTINEL: &str = "-";

/// Types with a schema description
pub trait Reflect: 'static {
    /// Describe the type
    fn descriptor() -> TypeDescriptor;
}

/// Types that describe their own schema instead of being reflected structurally
///
/// Wired into the descriptor with `#[expose(provider)]`. The generator gives access to the
/// shared table so nested types can still be generated or referenced.
pub trait SchemaProvider {
    fn schema(generator: &mut Generator<'_>) -> ExposeResult<SchemaRef>;
}

/// Hook stored on a descriptor whose type implements [`SchemaProvider`]
pub type SchemaProviderFn = fn(&mut Generator<'_>) -> ExposeResult<SchemaRef>;

/// Lazily evaluated descriptor, used for fields so recursive types stay finite
pub type DescriptorFn = fn() -> TypeDescriptor;

/// Runtime handle to a native type
#[derive(Clone)]
pub struct TypeDescriptor {
    pub kind: TypeKind,
    /// Type name without module path
    pub name: Cow<'static, str>,
    /// Defining module (`None` for builtins)
    pub module_path: Option<&'static str>,
    pub type_id: TypeId,
    pub provider: Option<SchemaProviderFn>,
    /// Doc comment of the type, used as schema description
    pub docs: Option<&'static str>,
    /// Set on instantiations of generic types
    pub generic: Option<GenericArgs>,
}

/// Base name and type arguments of a generic instantiation, e.g. `Page` and `[User]`
#[derive(Clone)]
pub struct GenericArgs {
    pub base: Cow<'static, str>,
    pub args: Vec<TypeDescriptor>,
}

/// Shape of a described type
#[derive(Clone)]
pub enum TypeKind {
    Primitive(Primitive),
    Struct(Vec<FieldDescriptor>),
    /// Single field tuple struct, serialized as its inner value
    Newtype(DescriptorFn),
    /// Unit-only enum, serialized as one of the variant names
    Enum(Vec<Cow<'static, str>>),
    List(Box<TypeDescriptor>),
    /// String keyed map, described by its value type
    Map(Box<TypeDescriptor>),
    Pointer(Box<TypeDescriptor>),
    Optional(Box<TypeDescriptor>),
    /// Any JSON value
    Dynamic,
    /// Types that cannot be described (channels, function handles)
    Unsupported(&'static str),
}

/// Primitive scalar types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    I128,
    Isize,
    U8,
    U16,
    U32,
    U64,
    U128,
    Usize,
    F32,
    F64,
    Char,
    String,
}

impl Primitive {
    /// Canonical name, also used as schema identifier
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::I128 => "i128",
            Primitive::Isize => "isize",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::U128 => "u128",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Char => "char",
            Primitive::String => "String",
        }
    }

    /// Schema for a value of this primitive
    pub fn schema(self) -> Schema {
        match self {
            Primitive::Bool => Schema::of_type("boolean"),
            Primitive::I8 | Primitive::I16 | Primitive::I32 => {
                Schema::of_type("integer").with_format("int32")
            }
            Primitive::I64 | Primitive::Isize => Schema::of_type("integer").with_format("int64"),
            Primitive::I128 => Schema::of_type("integer"),
            Primitive::U8 | Primitive::U16 | Primitive::U32 => Schema::of_type("integer")
                .with_format("int32")
                .with_minimum(0.0),
            Primitive::U64 | Primitive::Usize => Schema::of_type("integer")
                .with_format("int64")
                .with_minimum(0.0),
            Primitive::U128 => Schema::of_type("integer").with_minimum(0.0),
            Primitive::F32 => Schema::of_type("number").with_format("float"),
            Primitive::F64 => Schema::of_type("number").with_format("double"),
            Primitive::Char | Primitive::String => Schema::of_type("string"),
        }
    }
}

/// Struct field metadata
#[derive(Clone)]
pub struct FieldDescriptor {
    /// Declared field name
    pub name: &'static str,
    /// `None` when the field is skipped and carries no type information
    pub ty: Option<DescriptorFn>,
    pub tag: FieldTag,
    pub docs: Option<&'static str>,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, ty: DescriptorFn) -> Self {
        Self {
            name,
            ty: Some(ty),
            tag: FieldTag::default(),
            docs: None,
        }
    }

    /// A field excluded from schemas
    pub fn skipped(name: &'static str) -> Self {
        Self {
            name,
            ty: None,
            tag: FieldTag::default().with_rename(IGNORE_SENTINEL),
            docs: None,
        }
    }

    pub fn with_tag(mut self, tag: FieldTag) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_docs(mut self, docs: &'static str) -> Self {
        self.docs = Some(docs);
        self
    }

    /// Name the field is serialized under
    pub fn resolved_name(&self) -> &str {
        match self.tag.rename.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.name,
        }
    }

    pub fn is_ignored(&self) -> bool {
        self.ty.is_none() || self.tag.is_ignored()
    }
}

/// When a field may be left out of a payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OmitPolicy {
    #[default]
    Never,
    OmitEmpty,
}

/// Per-field naming annotations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTag {
    pub rename: Option<Cow<'static, str>>,
    pub omit: OmitPolicy,
    /// Field properties are merged into the parent
    pub flatten: bool,
}

impl FieldTag {
    pub fn with_rename(mut self, rename: impl Into<Cow<'static, str>>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    pub fn omit_empty(mut self) -> Self {
        self.omit = OmitPolicy::OmitEmpty;
        self
    }

    pub fn flatten(mut self) -> Self {
        self.flatten = true;
        self
    }

    /// No annotation at all
    pub fn is_empty(&self) -> bool {
        self.rename.is_none() && self.omit == OmitPolicy::Never && !self.flatten
    }

    pub fn is_ignored(&self) -> bool {
        self.rename.as_deref() == Some(IGNORE_SENTINEL)
    }
}

impl TypeDescriptor {
    fn new<T: ?Sized + 'static>(kind: TypeKind, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            kind,
            name: name.into(),
            module_path: None,
            type_id: TypeId::of::<T>(),
            provider: None,
            docs: None,
            generic: None,
        }
    }

    pub fn primitive<T: ?Sized + 'static>(primitive: Primitive) -> Self {
        Self::new::<T>(TypeKind::Primitive(primitive), primitive.name())
    }

    pub fn structure<T: ?Sized + 'static>(
        name: impl Into<Cow<'static, str>>,
        module_path: &'static str,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self::new::<T>(TypeKind::Struct(fields), name).in_module(module_path)
    }

    pub fn newtype<T: ?Sized + 'static>(
        name: impl Into<Cow<'static, str>>,
        module_path: &'static str,
        inner: DescriptorFn,
    ) -> Self {
        Self::new::<T>(TypeKind::Newtype(inner), name).in_module(module_path)
    }

    pub fn enumeration<T: ?Sized + 'static>(
        name: impl Into<Cow<'static, str>>,
        module_path: &'static str,
        variants: Vec<Cow<'static, str>>,
    ) -> Self {
        Self::new::<T>(TypeKind::Enum(variants), name).in_module(module_path)
    }

    pub fn list<T: ?Sized + 'static>(elem: TypeDescriptor) -> Self {
        let name = format!("{}List", elem.name);
        Self::new::<T>(TypeKind::List(Box::new(elem)), name)
    }

    pub fn map<T: ?Sized + 'static>(value: TypeDescriptor) -> Self {
        let name = format!("{}Map", value.name);
        Self::new::<T>(TypeKind::Map(Box::new(value)), name)
    }

    pub fn pointer<T: ?Sized + 'static>(inner: TypeDescriptor) -> Self {
        let name = inner.name.clone();
        Self::new::<T>(TypeKind::Pointer(Box::new(inner)), name)
    }

    pub fn optional<T: ?Sized + 'static>(inner: TypeDescriptor) -> Self {
        let name = inner.name.clone();
        Self::new::<T>(TypeKind::Optional(Box::new(inner)), name)
    }

    pub fn dynamic<T: ?Sized + 'static>() -> Self {
        Self::new::<T>(TypeKind::Dynamic, "any")
    }

    pub fn unsupported<T: ?Sized + 'static>(
        name: impl Into<Cow<'static, str>>,
        reason: &'static str,
    ) -> Self {
        Self::new::<T>(TypeKind::Unsupported(reason), name)
    }

    pub fn in_module(mut self, module_path: &'static str) -> Self {
        self.module_path = Some(module_path);
        self
    }

    pub fn with_provider(mut self, provider: SchemaProviderFn) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_docs(mut self, docs: &'static str) -> Self {
        self.docs = Some(docs);
        self
    }

    /// Record the base name and arguments of a generic instantiation
    pub fn with_type_args(
        mut self,
        base: impl Into<Cow<'static, str>>,
        args: Vec<TypeDescriptor>,
    ) -> Self {
        self.generic = Some(GenericArgs {
            base: base.into(),
            args,
        });
        self
    }

    /// Whether this descriptor describes `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Strip pointers and optionals
    pub fn deref(&self) -> &TypeDescriptor {
        match &self.kind {
            TypeKind::Pointer(inner) | TypeKind::Optional(inner) => inner.deref(),
            _ => self,
        }
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    /// Name including the module path, for diagnostics
    pub fn display_name(&self) -> String {
        match self.module_path {
            Some(module) => format!("{module}::{}", self.name),
            None => self.name.to_string(),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("module_path", &self.module_path)
            .field("kind", &self.kind)
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Primitive(p) => write!(f, "Primitive({})", p.name()),
            TypeKind::Struct(fields) => f
                .debug_list()
                .entries(fields.iter().map(|field| field.name))
                .finish(),
            TypeKind::Newtype(_) => write!(f, "Newtype"),
            TypeKind::Enum(variants) => write!(f, "Enum({variants:?})"),
            TypeKind::List(elem) => write!(f, "List({})", elem.name),
            TypeKind::Map(value) => write!(f, "Map({})", value.name),
            TypeKind::Pointer(inner) => write!(f, "Pointer({})", inner.name),
            TypeKind::Optional(inner) => write!(f, "Optional({})", inner.name),
            TypeKind::Dynamic => write!(f, "Dynamic"),
            TypeKind::Unsupported(reason) => write!(f, "Unsupported({reason})"),
        }
    }
}

macro_rules! impl_primitive {
    ($($ty:ty => $primitive:ident),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::primitive::<$ty>(Primitive::$primitive)
                }
            }
        )*
    };
}

impl_primitive! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    str => String,
    &'static str => String,
    Cow<'static, str> => String,
}

macro_rules! impl_list {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<T: Reflect> Reflect for $ty<T> {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::list::<Self>(T::descriptor())
                }
            }
        )*
    };
}

impl_list!(Vec, VecDeque, BTreeSet);

impl<T: Reflect, S: 'static> Reflect for HashSet<T, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list::<Self>(T::descriptor())
    }
}

impl<T: Reflect> Reflect for [T] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list::<Self>(T::descriptor())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::list::<Self>(T::descriptor())
    }
}

impl<K: 'static, V: Reflect, S: 'static> Reflect for HashMap<K, V, S> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map::<Self>(V::descriptor())
    }
}

impl<K: 'static, V: Reflect> Reflect for BTreeMap<K, V> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::map::<Self>(V::descriptor())
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::optional::<Self>(T::descriptor())
    }
}

macro_rules! impl_pointer {
    ($($ty:ident),* $(,)?) => {
        $(
            impl<T: ?Sized + Reflect> Reflect for $ty<T> {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::pointer::<Self>(T::descriptor())
                }
            }
        )*
    };
}

impl_pointer!(Box, Arc, Rc);

impl Reflect for serde_json::Value {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::dynamic::<Self>()
    }
}

macro_rules! impl_unsupported {
    ($reason:literal => $($ty:ident),* $(,)?) => {
        $(
            impl<T: 'static> Reflect for $ty<T> {
                fn descriptor() -> TypeDescriptor {
                    TypeDescriptor::unsupported::<Self>(stringify!($ty), $reason)
                }
            }
        )*
    };
}

impl_unsupported!("channels cannot be described" => Sender, SyncSender, Receiver);

impl<R: 'static> Reflect for fn() -> R {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::unsupported::<Self>("fn", "functions cannot be described")
    }
}

impl<A: 'static, R: 'static> Reflect for fn(A) -> R {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::unsupported::<Self>("fn", "functions cannot be described")
    }
}

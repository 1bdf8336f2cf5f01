//! Host type descriptions and their classification into language types
//!
//! Instead of inspecting host types at evaluation time, every host type
//! describes itself once through [`Host::describe`]. Records add their field
//! annotations through [`crate::schema::Record`], usually by way of the
//! [`crate::record!`] macro.

use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{Function, Type, Value};
use crate::schema::{self, FieldDecl, Record};

/* ===================== Type Descriptions ===================== */

/// Structural shape of a host type.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Duration,
    /// The error half of a fallible function result.
    Error,
    /// One level of indirection (`Box`, `Option`, `Arc`).
    Pointer(Box<TypeDesc>),
    Slice(Box<TypeDesc>),
    Array(Box<TypeDesc>, usize),
    Map(Box<TypeDesc>, Box<TypeDesc>),
    Record(RecordDesc),
    Func { returns: Vec<TypeDesc> },
    /// Accepts any value.
    Any,
    /// No structural mapping at all.
    Opaque,
}

/// Identity and field list of a record type.
#[derive(Clone, Copy)]
pub struct RecordDesc {
    pub id: TypeId,
    pub name: &'static str,
    pub fields: fn() -> Vec<FieldDecl>,
}

impl fmt::Debug for RecordDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordDesc").field("name", &self.name).finish()
    }
}

impl PartialEq for RecordDesc {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Static description of a host type.
#[derive(Debug, Clone)]
pub struct TypeDesc {
    name: &'static str,
    kind: TypeKind,
    capsule: bool,
    text: bool,
}

impl TypeDesc {
    pub fn new(name: &'static str, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            capsule: false,
            text: false,
        }
    }

    pub fn record<T: Record>() -> Self {
        Self::new(
            type_name::<T>(),
            TypeKind::Record(RecordDesc {
                id: TypeId::of::<T>(),
                name: type_name::<T>(),
                fields: T::fields,
            }),
        )
    }

    pub fn pointer(inner: TypeDesc) -> Self {
        Self::new("pointer", TypeKind::Pointer(Box::new(inner)))
    }

    pub fn slice(elem: TypeDesc) -> Self {
        Self::new("slice", TypeKind::Slice(Box::new(elem)))
    }

    pub fn func(returns: Vec<TypeDesc>) -> Self {
        Self::new("function", TypeKind::Func { returns })
    }

    pub fn error() -> Self {
        Self::new("error", TypeKind::Error)
    }

    /// Mark the type as a capsule regardless of its shape.
    pub fn capsule_marked(mut self) -> Self {
        self.capsule = true;
        self
    }

    /// Mark the type as converting to and from text.
    pub fn text_marshaled(mut self) -> Self {
        self.text = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn is_capsule_marked(&self) -> bool {
        self.capsule
    }

    pub fn is_text_marshaled(&self) -> bool {
        self.text
    }

    /// Strip every level of pointer indirection.
    pub fn deref(&self) -> &TypeDesc {
        let mut ty = self;
        while let TypeKind::Pointer(inner) = &ty.kind {
            ty = inner.as_ref();
        }
        ty
    }

    /// The record behind any indirection, if this is a record type.
    pub fn as_record(&self) -> Option<&RecordDesc> {
        match &self.deref().kind {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }
}

/* ===================== Host Trait ===================== */

/// A host type that can participate in configuration.
pub trait Host: 'static {
    fn describe() -> TypeDesc;
}

macro_rules! primitive_host {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Host for $ty {
                fn describe() -> TypeDesc {
                    TypeDesc::new(type_name::<$ty>(), TypeKind::$kind)
                }
            }
        )*
    };
}

primitive_host! {
    bool => Bool,
    i8 => Int,
    i16 => Int,
    i32 => Int,
    i64 => Int,
    isize => Int,
    u8 => Uint,
    u16 => Uint,
    u32 => Uint,
    u64 => Uint,
    usize => Uint,
    f32 => Float,
    f64 => Float,
    String => Str,
    &'static str => Str,
    Duration => Duration,
}

impl<T: Host> Host for Box<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new(type_name::<Self>(), TypeKind::Pointer(Box::new(T::describe())))
    }
}

impl<T: Host> Host for Option<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new(type_name::<Self>(), TypeKind::Pointer(Box::new(T::describe())))
    }
}

impl<T: Host> Host for Arc<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new(type_name::<Self>(), TypeKind::Pointer(Box::new(T::describe())))
    }
}

impl<T: Host> Host for Vec<T> {
    fn describe() -> TypeDesc {
        TypeDesc::new(type_name::<Self>(), TypeKind::Slice(Box::new(T::describe())))
    }
}

impl<T: Host, const N: usize> Host for [T; N] {
    fn describe() -> TypeDesc {
        TypeDesc::new(type_name::<Self>(), TypeKind::Array(Box::new(T::describe()), N))
    }
}

impl<K: Host, V: Host, S: 'static> Host for HashMap<K, V, S> {
    fn describe() -> TypeDesc {
        TypeDesc::new(
            type_name::<Self>(),
            TypeKind::Map(Box::new(K::describe()), Box::new(V::describe())),
        )
    }
}

impl<K: Host, V: Host> Host for BTreeMap<K, V> {
    fn describe() -> TypeDesc {
        TypeDesc::new(
            type_name::<Self>(),
            TypeKind::Map(Box::new(K::describe()), Box::new(V::describe())),
        )
    }
}

impl Host for Value {
    fn describe() -> TypeDesc {
        TypeDesc::new("any", TypeKind::Any)
    }
}

impl Host for Function {
    fn describe() -> TypeDesc {
        TypeDesc::func(vec![Value::describe(), TypeDesc::error()])
    }
}

/* ===================== Classification ===================== */

/// Classify a host type into its language [`Type`].
///
/// Capability markers win over structure and are honoured at every level of
/// indirection. After that the underlying shape decides, with anything that
/// has no structural mapping becoming a capsule.
pub fn classify(desc: &TypeDesc) -> Type {
    let mut ty = desc;
    loop {
        if ty.capsule {
            return Type::Capsule;
        }
        if ty.text {
            return Type::String;
        }
        match &ty.kind {
            TypeKind::Pointer(inner) => ty = inner.as_ref(),
            _ => break,
        }
    }

    match &ty.kind {
        TypeKind::Duration => Type::String,
        TypeKind::Bool => Type::Bool,
        TypeKind::Int | TypeKind::Uint | TypeKind::Float => Type::Number,
        TypeKind::Str => Type::String,

        // A collection of labeled blocks is keyed by label.
        TypeKind::Slice(elem) | TypeKind::Array(elem, _) => match &elem.kind {
            TypeKind::Record(record) if schema::tag_info_for(record).label().is_some() => {
                Type::Object
            }
            _ => Type::Array,
        },

        TypeKind::Map(key, _) => match key.kind {
            TypeKind::Str => Type::Object,
            _ => Type::Capsule,
        },

        TypeKind::Record(record) => {
            if (record.fields)().is_empty() {
                Type::Capsule
            } else {
                Type::Object
            }
        }

        TypeKind::Func { returns } => match returns.as_slice() {
            [ret] if ret.is_error() => Type::Capsule,
            [_] => Type::Function,
            [first, second] if !first.is_error() && second.is_error() => Type::Function,
            _ => Type::Capsule,
        },

        TypeKind::Any | TypeKind::Error | TypeKind::Opaque => Type::Capsule,

        TypeKind::Pointer(_) => unreachable!("indirection stripped above"),
    }
}

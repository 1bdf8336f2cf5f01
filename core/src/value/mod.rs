//! Runtime value model
//!
//! Every value flowing through the language belongs to exactly one of eight
//! [`Type`]s. Host types are mapped onto those types by [`classify`], and
//! concrete values are carried around as [`Value`].
//!
//! Capsules are the escape hatch: any host value without a structural mapping
//! (secrets, maps with non-string keys, opaque handles) travels as a
//! [`Capsule`] and compares by deep equality of the wrapped value.

mod classify;
mod number;


pub use classify::{classify, Host, RecordDesc, TypeDesc, TypeKind};
pub use number::{fit_kind, Number, NumberKind};

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::interpreter::EvalError;

/* ===================== Types ===================== */

/// The dynamic type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Null,
    Number,
    String,
    Bool,
    Array,
    Object,
    Function,
    Capsule,
}

impl Type {
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Null => "null",
            Type::Number => "number",
            Type::String => "string",
            Type::Bool => "bool",
            Type::Array => "array",
            Type::Object => "object",
            Type::Function => "function",
            Type::Capsule => "capsule",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/* ===================== Capsules ===================== */

/// A host value carried opaquely through the language.
///
/// Implemented for every `'static` type with `PartialEq` and `Debug`, so any
/// such value can be encapsulated.
pub trait CapsuleValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Deep equality against another capsule's contents.
    fn eq_capsule(&self, other: &dyn CapsuleValue) -> bool;
}

impl<T> CapsuleValue for T
where
    T: Any + Send + Sync + fmt::Debug + PartialEq,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_capsule(&self, other: &dyn CapsuleValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

#[derive(Clone)]
pub struct Capsule(Arc<dyn CapsuleValue>);

impl Capsule {
    pub fn new<T: CapsuleValue>(inner: T) -> Self {
        Capsule(Arc::new(inner))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

impl PartialEq for Capsule {
    fn eq(&self, other: &Self) -> bool {
        (*self.0).eq_capsule(&*other.0)
    }
}

impl fmt::Debug for Capsule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "capsule({:?})", &*self.0)
    }
}

/* ===================== Functions ===================== */

type NativeFn = dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync;

/// A native function exposed to the language.
#[derive(Clone)]
pub struct Function {
    name: String,
    func: Arc<NativeFn>,
}

impl Function {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.func)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function({})", self.name)
    }
}

/* ===================== Values ===================== */

/// Runtime value
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Number(Number),
    String(String),
    Bool(bool),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(Function),
    Capsule(Capsule),
}

impl Value {
    pub fn ty(&self) -> Type {
        match self {
            Value::Null => Type::Null,
            Value::Number(_) => Type::Number,
            Value::String(_) => Type::String,
            Value::Bool(_) => Type::Bool,
            Value::Array(_) => Type::Array,
            Value::Object(_) => Type::Object,
            Value::Function(_) => Type::Function,
            Value::Capsule(_) => Type::Capsule,
        }
    }

    pub fn encapsulate<T: CapsuleValue>(inner: T) -> Self {
        Value::Capsule(Capsule::new(inner))
    }

    pub fn int(v: i64) -> Self {
        Value::Number(Number::Int(v))
    }

    pub fn uint(v: u64) -> Self {
        Value::Number(Number::Uint(v))
    }

    pub fn float(v: f64) -> Self {
        Value::Number(Number::Float(v))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_capsule(&self) -> Option<&Capsule> {
        match self {
            Value::Capsule(c) => Some(c),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    /// Language equality: values of different types are never equal,
    /// numbers compare after kind promotion, object key order is irrelevant
    /// and functions never compare equal (not even to themselves).
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| a == b)
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, value)| b.get(key).is_some_and(|other| value == other))
            }
            (Value::Function(_), Value::Function(_)) => false,
            (Value::Capsule(a), Value::Capsule(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object(fields) => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", key, value)?;
                }
                f.write_str(" }")
            }
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Capsule(c) => write!(f, "{:?}", c),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Number(Number::Int(v)) => serializer.serialize_i64(*v),
            Value::Number(Number::Uint(v)) => serializer.serialize_u64(*v),
            Value::Number(Number::Float(v)) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Value::Function(func) => serializer.serialize_str(&format!("{:?}", func)),
            Value::Capsule(c) => serializer.serialize_str(&format!("{:?}", c)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Number> for Value {
    fn from(v: Number) -> Self {
        Value::Number(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Object(v)
    }
}

//! Built-in capsule types for sensitive strings
//!
//! `Secret` is always redacted. `OptionalSecret` carries a flag deciding
//! whether its text may be shown; values read from plain configuration are
//! usually not secret, while values sourced from the environment or a vault
//! are.
//!
//! Both travel through the language as capsules and are never treated as
//! plain strings, except where the binary operators explicitly coerce them.

use std::fmt;

use crate::value::{Host, TypeDesc, TypeKind, Value};

const REDACTED: &str = "(secret)";

/// A string whose contents must never be displayed.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// The raw secret text.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<Secret> for Value {
    fn from(secret: Secret) -> Self {
        Value::encapsulate(secret)
    }
}

impl Host for Secret {
    fn describe() -> TypeDesc {
        TypeDesc::new("Secret", TypeKind::Opaque).capsule_marked()
    }
}

/// A string that is redacted only when flagged as secret.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct OptionalSecret {
    pub value: String,
    pub is_secret: bool,
}

impl OptionalSecret {
    pub fn public(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_secret: false,
        }
    }

    pub fn secret(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            is_secret: true,
        }
    }
}

impl fmt::Debug for OptionalSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_secret {
            f.write_str(REDACTED)
        } else {
            write!(f, "{:?}", self.value)
        }
    }
}

impl fmt::Display for OptionalSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_secret {
            f.write_str(REDACTED)
        } else {
            f.write_str(&self.value)
        }
    }
}

impl From<OptionalSecret> for Value {
    fn from(secret: OptionalSecret) -> Self {
        Value::encapsulate(secret)
    }
}

impl Host for OptionalSecret {
    fn describe() -> TypeDesc {
        TypeDesc::new("OptionalSecret", TypeKind::Opaque).capsule_marked()
    }
}

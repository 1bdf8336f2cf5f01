//! Numeric values and kind promotion

use std::fmt;

/// The representation a number is stored in.
///
/// Variants are declared in promotion order: mixing kinds in arithmetic or
/// comparison promotes both sides to the greater of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NumberKind {
    Uint,
    Int,
    Float,
}

impl fmt::Display for NumberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberKind::Uint => "uint",
            NumberKind::Int => "int",
            NumberKind::Float => "float",
        };
        f.write_str(name)
    }
}

/// Returns the kind both operands are promoted to (Uint < Int < Float).
pub fn fit_kind(a: NumberKind, b: NumberKind) -> NumberKind {
    a.max(b)
}

/// A number tagged with its native representation.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Number {
    pub fn kind(&self) -> NumberKind {
        match self {
            Number::Int(_) => NumberKind::Int,
            Number::Uint(_) => NumberKind::Uint,
            Number::Float(_) => NumberKind::Float,
        }
    }

    /// The value as a signed integer, truncating or reinterpreting as needed.
    pub fn int(&self) -> i64 {
        match *self {
            Number::Int(v) => v,
            Number::Uint(v) => v as i64,
            Number::Float(v) => v as i64,
        }
    }

    /// The value as an unsigned integer, truncating or reinterpreting as needed.
    pub fn uint(&self) -> u64 {
        match *self {
            Number::Int(v) => v as u64,
            Number::Uint(v) => v,
            Number::Float(v) => v as u64,
        }
    }

    pub fn float(&self) -> f64 {
        match *self {
            Number::Int(v) => v as f64,
            Number::Uint(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// Checks for zero using the number's own kind.
    pub fn is_zero(&self) -> bool {
        match *self {
            Number::Int(v) => v == 0,
            Number::Uint(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }

    /// Parse number literal text.
    ///
    /// Integer text becomes `Int` when it fits in an i64, `Uint` when it only
    /// fits in a u64, and `Float` beyond that. Text with a fraction or an
    /// exponent is always a `Float`.
    pub fn parse(text: &str) -> Option<Number> {
        let is_integer = text
            .strip_prefix('-')
            .unwrap_or(text)
            .chars()
            .all(|c| c.is_ascii_digit());

        if is_integer {
            if let Ok(v) = text.parse::<i64>() {
                return Some(Number::Int(v));
            }
            if let Ok(v) = text.parse::<u64>() {
                return Some(Number::Uint(v));
            }
        }
        text.parse::<f64>().ok().map(Number::Float)
    }
}

impl PartialEq for Number {
    /// Numbers compare after promotion, so `3 == 3.0`.
    fn eq(&self, other: &Self) -> bool {
        match fit_kind(self.kind(), other.kind()) {
            NumberKind::Uint => self.uint() == other.uint(),
            NumberKind::Int => self.int() == other.int(),
            NumberKind::Float => self.float() == other.float(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{}", v),
            Number::Uint(v) => write!(f, "{}", v),
            Number::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        Number::Int(v)
    }
}

impl From<u64> for Number {
    fn from(v: u64) -> Self {
        Number::Uint(v)
    }
}

impl From<f64> for Number {
    fn from(v: f64) -> Self {
        Number::Float(v)
    }
}

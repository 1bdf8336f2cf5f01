//! Expression evaluation
//!
//! [`evaluate`] applies one binary operator to two values. [`eval_expr`]
//! walks a whole expression tree against a scope of named values.

mod binary;
mod expressions;

#[cfg(test)]
mod tests;

pub use crate::ast::BinaryOp;
pub use binary::evaluate;
pub use expressions::{eval_expr, is_constant, Scope};

use std::fmt;

use thiserror::Error;

use crate::ast::LiteralKind;
use crate::value::{Type, Value};

/// Which operand of a binary operator an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Lhs,
    Rhs,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Lhs => f.write_str("left"),
            Side::Rhs => f.write_str("right"),
        }
    }
}

/// The set of types an operator accepts, rendered as `[number, string]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeList(pub &'static [Type]);

impl fmt::Display for TypeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
        }
        f.write_str("]")
    }
}

#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// An operand's type is not accepted by the operator at all.
    #[error("{side} operand {value}: should be one of {allowed} for binop {op}, got {actual}")]
    UnsupportedType {
        side: Side,
        value: Value,
        op: BinaryOp,
        allowed: TypeList,
        actual: Type,
    },

    /// Both operands are accepted but their types differ.
    #[error("{value}: expected {expected}, got {actual}")]
    TypeMismatch {
        value: Value,
        expected: Type,
        actual: Type,
    },

    #[error("{value}: divide by zero error")]
    DivideByZero { value: Value },

    #[error("could not perform binop {op} for unknown capsules {lhs} and {rhs}")]
    UnknownCapsule { op: BinaryOp, lhs: Value, rhs: Value },

    #[error("identifier {0:?} does not exist")]
    UndefinedIdentifier(String),

    #[error("invalid {kind:?} literal {raw:?}")]
    InvalidLiteral { kind: LiteralKind, raw: String },

    #[error("{0}")]
    Unsupported(String),
}

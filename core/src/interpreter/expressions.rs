//! Expression evaluation
//!
//! Evaluates syntax-tree expressions to values. Identifiers resolve against
//! a flat scope; dotted identifiers walk into object values.

use std::collections::{BTreeMap, HashMap};

use super::{evaluate, EvalError};
use crate::ast::{Expr, Literal, LiteralKind};
use crate::value::{Number, Value};

/// Named values visible to an expression.
pub type Scope = HashMap<String, Value>;

/// Evaluate an expression to a value
pub fn eval_expr(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(lit) => lit.to_value(),

        Expr::Identifier { name, .. } => lookup(name, scope),

        Expr::Array { elements, .. } => elements
            .iter()
            .map(|element| eval_expr(element, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),

        Expr::Object { fields, .. } => {
            let mut object = BTreeMap::new();
            for (key, value) in fields {
                object.insert(key.clone(), eval_expr(value, scope)?);
            }
            Ok(Value::Object(object))
        }

        Expr::Binary {
            op, left, right, ..
        } => {
            let lhs = eval_expr(left, scope)?;
            let rhs = eval_expr(right, scope)?;
            evaluate(&lhs, *op, &rhs)
        }
    }
}

/// True if the expression references no identifiers and can be evaluated
/// without a scope.
pub fn is_constant(expr: &Expr) -> bool {
    match expr {
        Expr::Literal(_) => true,
        Expr::Identifier { .. } => false,
        Expr::Array { elements, .. } => elements.iter().all(is_constant),
        Expr::Object { fields, .. } => fields.iter().all(|(_, value)| is_constant(value)),
        Expr::Binary { left, right, .. } => is_constant(left) && is_constant(right),
    }
}

fn lookup(name: &str, scope: &Scope) -> Result<Value, EvalError> {
    if let Some(value) = scope.get(name) {
        return Ok(value.clone());
    }

    let mut segments = name.split('.');
    let root = segments.next().unwrap_or_default();
    let mut current = scope
        .get(root)
        .ok_or_else(|| EvalError::UndefinedIdentifier(name.to_string()))?;

    for segment in segments {
        current = match current {
            Value::Object(fields) => fields
                .get(segment)
                .ok_or_else(|| EvalError::UndefinedIdentifier(name.to_string()))?,
            other => {
                return Err(EvalError::Unsupported(format!(
                    "cannot access field {:?} of {} value",
                    segment,
                    other.ty()
                )))
            }
        };
    }

    Ok(current.clone())
}

impl Literal {
    /// Convert the literal's raw text to a value.
    pub fn to_value(&self) -> Result<Value, EvalError> {
        let invalid = || EvalError::InvalidLiteral {
            kind: self.kind,
            raw: self.value.clone(),
        };

        match self.kind {
            LiteralKind::Null => Ok(Value::Null),
            LiteralKind::String => Ok(Value::String(self.value.clone())),
            LiteralKind::Bool => match self.value.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid()),
            },
            LiteralKind::Number => Number::parse(&self.value)
                .map(Value::Number)
                .ok_or_else(invalid),
        }
    }
}

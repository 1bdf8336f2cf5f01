//! Binary operators over runtime values

use std::cmp::Ordering;

use super::{EvalError, Side, TypeList};
use crate::ast::BinaryOp;
use crate::secrets::{OptionalSecret, Secret};
use crate::value::{fit_kind, Number, NumberKind, Type, Value};

/// Apply `op` to two values.
///
/// Equality works on any pair of values. Every other operator first
/// reconciles secret capsules with plain strings, then requires both
/// operands to be of an accepted and identical type.
pub fn evaluate(lhs: &Value, op: BinaryOp, rhs: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => return Ok(Value::Bool(lhs == rhs)),
        BinaryOp::Neq => return Ok(Value::Bool(lhs != rhs)),
        _ => {}
    }

    let unwrapped = if lhs.ty() == Type::Capsule || rhs.ty() == Type::Capsule {
        unwrap_capsules(lhs, rhs)
    } else {
        None
    };
    let (l, r) = match &unwrapped {
        Some((l, r)) => (l, r),
        None => (lhs, rhs),
    };

    check_operand(Side::Lhs, lhs, l, op)?;
    check_operand(Side::Rhs, rhs, r, op)?;
    if l.ty() != r.ty() {
        return Err(EvalError::TypeMismatch {
            value: r.clone(),
            expected: l.ty(),
            actual: r.ty(),
        });
    }

    match op {
        BinaryOp::Or => {
            let (a, b) = bools(l, r);
            Ok(Value::Bool(a || b))
        }
        BinaryOp::And => {
            let (a, b) = bools(l, r);
            Ok(Value::Bool(a && b))
        }

        BinaryOp::Add => match (l, r) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (Value::Capsule(_), Value::Capsule(_)) => add_capsules(op, l, r),
            _ => {
                let (a, b) = numbers(l, r);
                Ok(arith(a, b, u64::wrapping_add, i64::wrapping_add, |x, y| x + y))
            }
        },
        BinaryOp::Sub => {
            let (a, b) = numbers(l, r);
            Ok(arith(a, b, u64::wrapping_sub, i64::wrapping_sub, |x, y| x - y))
        }
        BinaryOp::Mul => {
            let (a, b) = numbers(l, r);
            Ok(arith(a, b, u64::wrapping_mul, i64::wrapping_mul, |x, y| x * y))
        }
        BinaryOp::Div => {
            let (a, b) = nonzero_divisor(l, r, rhs)?;
            Ok(arith(a, b, u64::wrapping_div, i64::wrapping_div, |x, y| x / y))
        }
        BinaryOp::Mod => {
            let (a, b) = nonzero_divisor(l, r, rhs)?;
            Ok(arith(a, b, u64::wrapping_rem, i64::wrapping_rem, |x, y| x % y))
        }
        BinaryOp::Pow => {
            let (a, b) = numbers(l, r);
            Ok(arith(a, b, <u64 as IntPow>::int_pow, <i64 as IntPow>::int_pow, f64::powf))
        }

        BinaryOp::Lt => Ok(Value::Bool(compare(l, r, Ordering::is_lt))),
        BinaryOp::Lte => Ok(Value::Bool(compare(l, r, Ordering::is_le))),
        BinaryOp::Gt => Ok(Value::Bool(compare(l, r, Ordering::is_gt))),
        BinaryOp::Gte => Ok(Value::Bool(compare(l, r, Ordering::is_ge))),

        BinaryOp::Eq | BinaryOp::Neq => unreachable!("equality handled above"),
    }
}

/* ===================== Operand Types ===================== */

/// Types each operand of `op` may have.
pub(crate) fn allowed_types(op: BinaryOp) -> &'static [Type] {
    match op {
        BinaryOp::Or | BinaryOp::And => &[Type::Bool],
        BinaryOp::Add => &[Type::Number, Type::String, Type::Capsule],
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Pow => {
            &[Type::Number]
        }
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            &[Type::Number, Type::String]
        }
        BinaryOp::Eq | BinaryOp::Neq => unreachable!("equality accepts every type"),
    }
}

/// Reject an operand whose (possibly unwrapped) type the operator does not
/// accept. The error reports the operand as it was passed in.
fn check_operand(side: Side, original: &Value, operand: &Value, op: BinaryOp) -> Result<(), EvalError> {
    let allowed = allowed_types(op);
    if allowed.contains(&operand.ty()) {
        return Ok(());
    }
    Err(EvalError::UnsupportedType {
        side,
        value: original.clone(),
        op,
        allowed: TypeList(allowed),
        actual: operand.ty(),
    })
}

fn bools(l: &Value, r: &Value) -> (bool, bool) {
    match (l, r) {
        (Value::Bool(a), Value::Bool(b)) => (*a, *b),
        _ => unreachable!("operands checked as bool"),
    }
}

fn numbers(l: &Value, r: &Value) -> (Number, Number) {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => (*a, *b),
        _ => unreachable!("operands checked as number"),
    }
}

/// The divisor is checked in its own kind before any promotion.
fn nonzero_divisor(l: &Value, r: &Value, original: &Value) -> Result<(Number, Number), EvalError> {
    let (a, b) = numbers(l, r);
    if b.is_zero() {
        return Err(EvalError::DivideByZero {
            value: original.clone(),
        });
    }
    Ok((a, b))
}

/* ===================== Arithmetic ===================== */

fn arith(
    a: Number,
    b: Number,
    uint: fn(u64, u64) -> u64,
    int: fn(i64, i64) -> i64,
    float: fn(f64, f64) -> f64,
) -> Value {
    match fit_kind(a.kind(), b.kind()) {
        NumberKind::Uint => Value::uint(uint(a.uint(), b.uint())),
        NumberKind::Int => Value::int(int(a.int(), b.int())),
        NumberKind::Float => Value::float(float(a.float(), b.float())),
    }
}

fn compare(l: &Value, r: &Value, accept: fn(Ordering) -> bool) -> bool {
    let ordering = match (l, r) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => match fit_kind(a.kind(), b.kind()) {
            NumberKind::Uint => Some(a.uint().cmp(&b.uint())),
            NumberKind::Int => Some(a.int().cmp(&b.int())),
            NumberKind::Float => a.float().partial_cmp(&b.float()),
        },
        _ => unreachable!("operands checked as number or string"),
    };
    ordering.is_some_and(accept)
}

/// Integer exponentiation with wrapping multiplication.
///
/// `x ^ 0 == 1`, `1 ^ n == 1` and `0 ^ n == 0` for positive `n`. A negative
/// exponent leaves the base unchanged.
trait IntPow: Sized {
    fn int_pow(self, exp: Self) -> Self;
}

macro_rules! int_pow_impl {
    ($($ty:ty),*) => {
        $(
            impl IntPow for $ty {
                fn int_pow(self, exp: $ty) -> $ty {
                    if exp == 0 || self == 1 {
                        return 1;
                    }
                    if self == 0 && exp > 0 {
                        return 0;
                    }
                    if exp < 1 {
                        return self;
                    }

                    let (mut base, mut exp, mut acc): ($ty, $ty, $ty) = (self, exp, 1);
                    while exp > 0 {
                        if exp & 1 == 1 {
                            acc = acc.wrapping_mul(base);
                        }
                        base = base.wrapping_mul(base);
                        exp >>= 1;
                    }
                    acc
                }
            }
        )*
    };
}

int_pow_impl!(i64, u64);

/* ===================== Secrets ===================== */

/// How an operand takes part in secret coercion.
enum Sensitive<'a> {
    Secret(&'a Secret),
    Optional(&'a OptionalSecret),
    Plain(&'a str),
    Other,
}

fn sensitive(value: &Value) -> Sensitive<'_> {
    match value {
        Value::String(s) => Sensitive::Plain(s),
        Value::Capsule(capsule) => {
            if let Some(secret) = capsule.downcast_ref::<Secret>() {
                Sensitive::Secret(secret)
            } else if let Some(optional) = capsule.downcast_ref::<OptionalSecret>() {
                Sensitive::Optional(optional)
            } else {
                Sensitive::Other
            }
        }
        _ => Sensitive::Other,
    }
}

/// Bring a secret capsule and its partner to a common representation.
///
/// A `Secret` on either side makes both sides secrets. An `OptionalSecret`
/// paired with plain text either spreads its secrecy to the text or, when
/// not secret, degrades both sides to plain strings. Returns `None` when no
/// rule applies.
fn unwrap_capsules(lhs: &Value, rhs: &Value) -> Option<(Value, Value)> {
    let pair = match (sensitive(lhs), sensitive(rhs)) {
        (Sensitive::Secret(_), Sensitive::Optional(o)) => (lhs.clone(), Secret::new(&o.value).into()),
        (Sensitive::Secret(_), Sensitive::Plain(s)) => (lhs.clone(), Secret::new(s).into()),
        (Sensitive::Optional(o), Sensitive::Secret(_)) => (Secret::new(&o.value).into(), rhs.clone()),
        (Sensitive::Plain(s), Sensitive::Secret(_)) => (Secret::new(s).into(), rhs.clone()),

        (Sensitive::Optional(o), Sensitive::Plain(s)) if o.is_secret => {
            (lhs.clone(), OptionalSecret::secret(s).into())
        }
        (Sensitive::Optional(o), Sensitive::Plain(s)) => (Value::from(o.value.as_str()), Value::from(s)),
        (Sensitive::Plain(s), Sensitive::Optional(o)) if o.is_secret => {
            (OptionalSecret::secret(s).into(), rhs.clone())
        }
        (Sensitive::Plain(s), Sensitive::Optional(o)) => (Value::from(s), Value::from(o.value.as_str())),

        _ => return None,
    };
    Some(pair)
}

fn add_capsules(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    match (sensitive(l), sensitive(r)) {
        (Sensitive::Secret(a), Sensitive::Secret(b)) => {
            Ok(Secret::new(format!("{}{}", a.expose(), b.expose())).into())
        }
        (Sensitive::Optional(a), Sensitive::Optional(b)) => Ok(OptionalSecret {
            value: format!("{}{}", a.value, b.value),
            is_secret: a.is_secret || b.is_secret,
        }
        .into()),
        _ => Err(EvalError::UnknownCapsule {
            op,
            lhs: l.clone(),
            rhs: r.clone(),
        }),
    }
}

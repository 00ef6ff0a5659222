//! The expression engine.
//!
//! Operators dispatch on the pair of kind tags. Coercion happens in exactly
//! two places: `+` concatenates when either operand is a STRING, and
//! numeric operators widen INT to FLOAT when the kinds are mixed. Equality
//! is strict — mismatched kinds compare unequal, never error. Everything
//! else with incompatible kinds is a type error.

use std::cmp::Ordering;

use klang_types::Value;

use crate::ast::{BinaryOp, UnaryOp};
use crate::error::RuntimeError;

/// Apply a binary operator to two evaluated operands.
///
/// `&&` and `||` are short-circuited by the evaluator before operand
/// evaluation and never reach this function.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => sub(left, right),
        BinaryOp::Mul => mul(left, right),
        BinaryOp::Div => div(left, right),
        BinaryOp::Eq => Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOp::Lt => compare_values(left, right).map(|o| Value::Bool(o.is_lt())),
        BinaryOp::LtEq => compare_values(left, right).map(|o| Value::Bool(o.is_le())),
        BinaryOp::Gt => compare_values(left, right).map(|o| Value::Bool(o.is_gt())),
        BinaryOp::GtEq => compare_values(left, right).map(|o| Value::Bool(o.is_ge())),
        BinaryOp::And | BinaryOp::Or => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(match op {
                BinaryOp::And => *a && *b,
                _ => *a || *b,
            })),
            _ => Err(type_error(op, left, right)),
        },
    }
}

/// Apply a unary operator.
///
/// `!` negates a BOOLEAN; applied to any other present value it yields
/// `false`, so `!x` reads as a missingness probe on documents too. The
/// evaluator maps `!` on an unbound name to `true` before reaching here.
pub fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value, RuntimeError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(match value {
            Value::Bool(b) => !b,
            _ => false,
        })),
        UnaryOp::Neg => match value {
            Value::Int(i) => i
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::Arithmetic(format!("integer overflow negating {i}"))),
            Value::Float(x) => Ok(Value::Float(-x)),
            other => Err(RuntimeError::Type(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        },
    }
}

fn add(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", left.render(), right.render())))
        }
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Arithmetic(format!("integer overflow in {a} + {b}"))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 + b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a + *b as f64)),
        _ => Err(type_error(BinaryOp::Add, left, right)),
    }
}

fn sub(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_sub(*b)
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Arithmetic(format!("integer overflow in {a} - {b}"))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 - b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a - *b as f64)),
        _ => Err(type_error(BinaryOp::Sub, left, right)),
    }
}

fn mul(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_mul(*b)
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::Arithmetic(format!("integer overflow in {a} * {b}"))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(*a as f64 * b)),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(a * *b as f64)),
        _ => Err(type_error(BinaryOp::Mul, left, right)),
    }
}

fn div(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left, right) {
        // Integer division truncates toward zero.
        (Value::Int(a), Value::Int(b)) => {
            if *b == 0 {
                Err(RuntimeError::Arithmetic("division by zero".into()))
            } else {
                a.checked_div(*b)
                    .map(Value::Int)
                    .ok_or_else(|| RuntimeError::Arithmetic(format!("integer overflow in {a} / {b}")))
            }
        }
        (Value::Float(a), Value::Float(b)) => float_div(*a, *b),
        (Value::Int(a), Value::Float(b)) => float_div(*a as f64, *b),
        (Value::Float(a), Value::Int(b)) => float_div(*a, *b as f64),
        _ => Err(type_error(BinaryOp::Div, left, right)),
    }
}

fn float_div(a: f64, b: f64) -> Result<Value, RuntimeError> {
    if b == 0.0 {
        Err(RuntimeError::Arithmetic("division by zero".into()))
    } else {
        Ok(Value::Float(a / b))
    }
}

/// Strict equality: same kind and same value. Mismatched kinds are unequal.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

/// Ordering for `<`, `<=`, `>`, `>=`: numeric with widening, or
/// lexicographic between strings.
pub fn compare_values(left: &Value, right: &Value) -> Result<Ordering, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => ordered(*a, *b),
        (Value::Int(a), Value::Float(b)) => ordered(*a as f64, *b),
        (Value::Float(a), Value::Int(b)) => ordered(*a, *b as f64),
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        _ => Err(RuntimeError::Type(format!(
            "cannot order {} and {}",
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn ordered(a: f64, b: f64) -> Result<Ordering, RuntimeError> {
    a.partial_cmp(&b)
        .ok_or_else(|| RuntimeError::Arithmetic("NaN comparison".into()))
}

fn type_error(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::Type(format!(
        "operator {op} cannot combine {} and {}",
        left.type_name(),
        right.type_name()
    ))
}

//! Comparison operations: =, <, <=, >, >=
//!
//! `=` is the structural equality of the value algebra (lists and vectors
//! interchangeable, maps by per-key equality, functions never equal). The
//! numeric comparators take exactly two integers.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_TWO};
use crate::value::Value;
use std::rc::Rc;

fn two_ints(function: &str, args: &[Value]) -> Result<(i64, i64), EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error(function, ARITY_TWO, args.len()));
    }
    let a = match &args[0] {
        Value::Int(n) => *n,
        other => return Err(EvalError::type_error(function, "integer", other, 1)),
    };
    let b = match &args[1] {
        Value::Int(n) => *n,
        other => return Err(EvalError::type_error(function, "integer", other, 2)),
    };
    Ok((a, b))
}

/// Structural equality of two values
pub fn builtin_eq(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("=", ARITY_TWO, args.len()));
    }
    Ok(Value::Bool(args[0] == args[1]))
}

pub fn builtin_lt(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = two_ints("<", args)?;
    Ok(Value::Bool(a < b))
}

pub fn builtin_le(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = two_ints("<=", args)?;
    Ok(Value::Bool(a <= b))
}

pub fn builtin_gt(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = two_ints(">", args)?;
    Ok(Value::Bool(a > b))
}

pub fn builtin_ge(args: &[Value]) -> Result<Value, EvalError> {
    let (a, b) = two_ints(">=", args)?;
    Ok(Value::Bool(a >= b))
}

/// Register all comparison builtins in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("=", Value::builtin("=", builtin_eq));
    env.set("<", Value::builtin("<", builtin_lt));
    env.set("<=", Value::builtin("<=", builtin_le));
    env.set(">", Value::builtin(">", builtin_gt));
    env.set(">=", Value::builtin(">=", builtin_ge));
}

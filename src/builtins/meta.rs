//! Metadata operations: with-meta, meta
//!
//! Metadata attaches to lists, vectors, maps, and functions. `with-meta`
//! returns a copy carrying the new metadata; the original value is never
//! touched. Metadata defaults to nil and is ignored by equality.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_ONE, ARITY_TWO};
use crate::value::Value;
use std::rc::Rc;

pub fn builtin_with_meta(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("with-meta", ARITY_TWO, args.len()));
    }
    args[0]
        .with_meta(args[1].clone())
        .ok_or_else(|| EvalError::type_error("with-meta", "collection or function", &args[0], 1))
}

pub fn builtin_meta(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("meta", ARITY_ONE, args.len()));
    }
    args[0]
        .meta()
        .ok_or_else(|| EvalError::type_error("meta", "collection or function", &args[0], 1))
}

/// Register the metadata builtins in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("with-meta", Value::builtin("with-meta", builtin_with_meta));
    env.set("meta", Value::builtin("meta", builtin_meta));
}

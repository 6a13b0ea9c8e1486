//! Error raising: throw
//!
//! `throw` raises any value as a user exception. The nearest enclosing
//! `try*` receives it unchanged through its `catch*` binding; uncaught it
//! reaches the driver, which prints it readably.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_ONE};
use crate::value::Value;
use std::rc::Rc;

pub fn builtin_throw(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("throw", ARITY_ONE, args.len()));
    }
    Err(EvalError::Thrown(args[0].clone()))
}

/// Register the throw builtin in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("throw", Value::builtin("throw", builtin_throw));
}

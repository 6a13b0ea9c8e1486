//! String operations: pr-str, str, read-string
//!
//! `pr-str` joins readable renderings with spaces; `str` joins raw
//! renderings with nothing. `read-string` invokes the reader on a string.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_ONE};
use crate::printer::pr_str;
use crate::reader::read_str;
use crate::value::Value;
use std::rc::Rc;

/// Readable rendering of the arguments, space-joined
pub fn builtin_pr_str(args: &[Value]) -> Result<Value, EvalError> {
    let joined = args
        .iter()
        .map(|arg| pr_str(arg, true))
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::Str(joined))
}

/// Raw rendering of the arguments, concatenated
pub fn builtin_str(args: &[Value]) -> Result<Value, EvalError> {
    let joined = args
        .iter()
        .map(|arg| pr_str(arg, false))
        .collect::<Vec<_>>()
        .join("");
    Ok(Value::Str(joined))
}

/// Reads one form from a string; an empty or comment-only string reads
/// as nil
pub fn builtin_read_string(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("read-string", ARITY_ONE, args.len()));
    }
    let source = match &args[0] {
        Value::Str(s) => s,
        other => return Err(EvalError::type_error("read-string", "string", other, 1)),
    };
    Ok(read_str(source)?.unwrap_or(Value::Nil))
}

/// Register all string builtins in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("pr-str", Value::builtin("pr-str", builtin_pr_str));
    env.set("str", Value::builtin("str", builtin_str));
    env.set(
        "read-string",
        Value::builtin("read-string", builtin_read_string),
    );
}

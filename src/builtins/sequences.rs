//! Sequence operations: list, vector, cons, concat, vec, nth, first,
//! rest, count, empty?, apply, map, and the sequence predicates
//!
//! Lists and vectors are interchangeable as inputs; operations that build
//! a sequence return a list unless documented otherwise (`vec`, `vector`).
//! `nil` is accepted wherever a sequence is expected and behaves as the
//! empty sequence.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_AT_LEAST_TWO, ARITY_ONE, ARITY_TWO};
use crate::eval::call_function;
use crate::value::Value;
use std::rc::Rc;

fn seq_arg<'a>(function: &str, args: &'a [Value], position: usize) -> Result<&'a [Value], EvalError> {
    match &args[position] {
        Value::List(items, _) | Value::Vector(items, _) => Ok(items.as_slice()),
        Value::Nil => Ok(&[]),
        other => Err(EvalError::type_error(function, "sequence", other, position + 1)),
    }
}

fn expect_args(function: &str, args: &[Value], count: usize, arity: &str) -> Result<(), EvalError> {
    if args.len() != count {
        return Err(EvalError::arity_error(function, arity, args.len()));
    }
    Ok(())
}

/// Creates a new list containing the given elements in order
pub fn builtin_list(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::list(args.to_vec()))
}

pub fn builtin_list_p(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("list?", args, 1, ARITY_ONE)?;
    Ok(Value::Bool(matches!(args[0], Value::List(_, _))))
}

/// Creates a new vector containing the given elements in order
pub fn builtin_vector(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::vector(args.to_vec()))
}

pub fn builtin_vector_p(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("vector?", args, 1, ARITY_ONE)?;
    Ok(Value::Bool(matches!(args[0], Value::Vector(_, _))))
}

pub fn builtin_sequential_p(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("sequential?", args, 1, ARITY_ONE)?;
    Ok(Value::Bool(matches!(
        args[0],
        Value::List(_, _) | Value::Vector(_, _)
    )))
}

/// Number of elements in a sequence; nil counts as 0
pub fn builtin_count(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("count", args, 1, ARITY_ONE)?;
    let items = seq_arg("count", args, 0)?;
    Ok(Value::Int(items.len() as i64))
}

pub fn builtin_empty_p(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("empty?", args, 1, ARITY_ONE)?;
    let items = seq_arg("empty?", args, 0)?;
    Ok(Value::Bool(items.is_empty()))
}

/// Prepends an element to a sequence, always producing a list
pub fn builtin_cons(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("cons", args, 2, ARITY_TWO)?;
    let tail = seq_arg("cons", args, 1)?;

    let mut items = Vec::with_capacity(tail.len() + 1);
    items.push(args[0].clone());
    items.extend_from_slice(tail);
    Ok(Value::list(items))
}

/// Concatenates any number of sequences into a list
pub fn builtin_concat(args: &[Value]) -> Result<Value, EvalError> {
    let mut items = Vec::new();
    for position in 0..args.len() {
        items.extend_from_slice(seq_arg("concat", args, position)?);
    }
    Ok(Value::list(items))
}

/// Converts a sequence into a vector
pub fn builtin_vec(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("vec", args, 1, ARITY_ONE)?;
    let items = seq_arg("vec", args, 0)?;
    Ok(Value::vector(items.to_vec()))
}

/// Element at an index; out-of-range indices are errors
pub fn builtin_nth(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("nth", args, 2, ARITY_TWO)?;
    let items = seq_arg("nth", args, 0)?;
    let index = match &args[1] {
        Value::Int(n) => *n,
        other => return Err(EvalError::type_error("nth", "integer", other, 2)),
    };

    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or_else(|| {
            EvalError::runtime_error(
                "nth",
                format!("index {index} out of range for sequence of length {}", items.len()),
            )
        })
}

/// First element, or nil for an empty sequence or nil
pub fn builtin_first(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("first", args, 1, ARITY_ONE)?;
    let items = seq_arg("first", args, 0)?;
    Ok(items.first().cloned().unwrap_or(Value::Nil))
}

/// Everything after the first element as a list; empty and nil yield ()
pub fn builtin_rest(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("rest", args, 1, ARITY_ONE)?;
    let items = seq_arg("rest", args, 0)?;
    Ok(Value::list(items.get(1..).unwrap_or(&[]).to_vec()))
}

/// Calls a function with positional arguments followed by a flattened
/// final sequence: `(apply f a b (c d))` is `(f a b c d)`
pub fn builtin_apply(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity_error("apply", ARITY_AT_LEAST_TWO, args.len()));
    }
    let trailing = seq_arg("apply", args, args.len() - 1)?;

    let mut call_args = Vec::with_capacity(args.len() - 2 + trailing.len());
    call_args.extend_from_slice(&args[1..args.len() - 1]);
    call_args.extend_from_slice(trailing);
    call_function(&args[0], &call_args)
}

/// Applies a function to each element of a sequence, returning a list of
/// the results in input order
pub fn builtin_map(args: &[Value]) -> Result<Value, EvalError> {
    expect_args("map", args, 2, ARITY_TWO)?;
    let items = seq_arg("map", args, 1)?;

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        out.push(call_function(&args[0], std::slice::from_ref(item))?);
    }
    Ok(Value::list(out))
}

/// Register all sequence builtins in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("list", Value::builtin("list", builtin_list));
    env.set("list?", Value::builtin("list?", builtin_list_p));
    env.set("vector", Value::builtin("vector", builtin_vector));
    env.set("vector?", Value::builtin("vector?", builtin_vector_p));
    env.set(
        "sequential?",
        Value::builtin("sequential?", builtin_sequential_p),
    );
    env.set("count", Value::builtin("count", builtin_count));
    env.set("empty?", Value::builtin("empty?", builtin_empty_p));
    env.set("cons", Value::builtin("cons", builtin_cons));
    env.set("concat", Value::builtin("concat", builtin_concat));
    env.set("vec", Value::builtin("vec", builtin_vec));
    env.set("nth", Value::builtin("nth", builtin_nth));
    env.set("first", Value::builtin("first", builtin_first));
    env.set("rest", Value::builtin("rest", builtin_rest));
    env.set("apply", Value::builtin("apply", builtin_apply));
    env.set("map", Value::builtin("map", builtin_map));
}

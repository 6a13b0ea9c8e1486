//! Atom operations: atom, atom?, deref, reset!, swap!
//!
//! Atoms are the only mutable values in the language: a single shared
//! cell. The interpreter is single-threaded, so updates need no locking.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_AT_LEAST_TWO, ARITY_ONE, ARITY_TWO};
use crate::eval::call_function;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

fn atom_arg<'a>(
    function: &str,
    args: &'a [Value],
    position: usize,
) -> Result<&'a Rc<RefCell<Value>>, EvalError> {
    match &args[position] {
        Value::Atom(cell) => Ok(cell),
        other => Err(EvalError::type_error(function, "atom", other, position + 1)),
    }
}

/// Wraps a value in a new atom
pub fn builtin_atom(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("atom", ARITY_ONE, args.len()));
    }
    Ok(Value::atom(args[0].clone()))
}

pub fn builtin_atom_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("atom?", ARITY_ONE, args.len()));
    }
    Ok(Value::Bool(matches!(args[0], Value::Atom(_))))
}

/// Current value of an atom
pub fn builtin_deref(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("deref", ARITY_ONE, args.len()));
    }
    let cell = atom_arg("deref", args, 0)?;
    Ok(cell.borrow().clone())
}

/// Overwrites an atom's value, returning the new value
pub fn builtin_reset(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("reset!", ARITY_TWO, args.len()));
    }
    let cell = atom_arg("reset!", args, 0)?;
    *cell.borrow_mut() = args[1].clone();
    Ok(args[1].clone())
}

/// Writes `(f current extra…)` into the atom and returns the new value
pub fn builtin_swap(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity_error("swap!", ARITY_AT_LEAST_TWO, args.len()));
    }
    let cell = atom_arg("swap!", args, 0)?;

    // The borrow must end before the function runs: it may touch this atom.
    let current = cell.borrow().clone();
    let mut call_args = Vec::with_capacity(args.len() - 1);
    call_args.push(current);
    call_args.extend_from_slice(&args[2..]);

    let updated = call_function(&args[1], &call_args)?;
    *cell.borrow_mut() = updated.clone();
    Ok(updated)
}

/// Register all atom builtins in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("atom", Value::builtin("atom", builtin_atom));
    env.set("atom?", Value::builtin("atom?", builtin_atom_p));
    env.set("deref", Value::builtin("deref", builtin_deref));
    env.set("reset!", Value::builtin("reset!", builtin_reset));
    env.set("swap!", Value::builtin("swap!", builtin_swap));
}

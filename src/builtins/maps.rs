//! Hash-map operations: hash-map, map?, assoc, dissoc, get, contains?,
//! keys, vals
//!
//! Maps are immutable: assoc and dissoc return new maps. Keys are scalars
//! only; `hash-map` and `assoc` reject composite keys the same way the
//! reader rejects them in literals. Lookup operations treat a composite
//! key as simply absent, since one can never have been inserted.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_AT_LEAST_ONE, ARITY_ONE, ARITY_TWO};
use crate::value::{MapKey, Value};
use std::collections::HashMap;
use std::rc::Rc;

fn map_arg<'a>(
    function: &str,
    args: &'a [Value],
    position: usize,
) -> Result<&'a HashMap<MapKey, Value>, EvalError> {
    match &args[position] {
        Value::Map(entries, _) => Ok(entries),
        other => Err(EvalError::type_error(function, "map", other, position + 1)),
    }
}

fn key_arg(function: &str, args: &[Value], position: usize) -> Result<MapKey, EvalError> {
    MapKey::from_value(&args[position]).ok_or_else(|| {
        EvalError::type_error(function, "scalar key", &args[position], position + 1)
    })
}

/// Builds a map from alternating keys and values
pub fn builtin_hash_map(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() % 2 != 0 {
        return Err(EvalError::runtime_error(
            "hash-map",
            format!("expected an even number of arguments, got {}", args.len()),
        ));
    }

    let mut entries = HashMap::with_capacity(args.len() / 2);
    for (position, pair) in args.chunks(2).enumerate() {
        let key = key_arg("hash-map", args, position * 2)?;
        entries.insert(key, pair[1].clone());
    }
    Ok(Value::map(entries))
}

pub fn builtin_map_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("map?", ARITY_ONE, args.len()));
    }
    Ok(Value::Bool(matches!(args[0], Value::Map(_, _))))
}

/// New map with the given key/value pairs added or overwritten
pub fn builtin_assoc(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_error("assoc", ARITY_AT_LEAST_ONE, 0));
    }
    let base = map_arg("assoc", args, 0)?;
    let pairs = &args[1..];
    if pairs.len() % 2 != 0 {
        return Err(EvalError::runtime_error(
            "assoc",
            format!("expected an even number of key/value arguments, got {}", pairs.len()),
        ));
    }

    let mut entries = base.clone();
    for position in (1..args.len()).step_by(2) {
        let key = key_arg("assoc", args, position)?;
        entries.insert(key, args[position + 1].clone());
    }
    Ok(Value::map(entries))
}

/// New map without the listed keys
pub fn builtin_dissoc(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity_error("dissoc", ARITY_AT_LEAST_ONE, 0));
    }
    let base = map_arg("dissoc", args, 0)?;

    let mut entries = base.clone();
    for arg in &args[1..] {
        // composite values can never be keys, so they remove nothing
        if let Some(key) = MapKey::from_value(arg) {
            entries.remove(&key);
        }
    }
    Ok(Value::map(entries))
}

/// Value for a key; nil for a missing key or a nil map
pub fn builtin_get(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("get", ARITY_TWO, args.len()));
    }
    if matches!(args[0], Value::Nil) {
        return Ok(Value::Nil);
    }
    let entries = map_arg("get", args, 0)?;
    let found = MapKey::from_value(&args[1]).and_then(|key| entries.get(&key).cloned());
    Ok(found.unwrap_or(Value::Nil))
}

pub fn builtin_contains_p(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity_error("contains?", ARITY_TWO, args.len()));
    }
    let entries = map_arg("contains?", args, 0)?;
    let present = MapKey::from_value(&args[1])
        .map(|key| entries.contains_key(&key))
        .unwrap_or(false);
    Ok(Value::Bool(present))
}

/// All keys as a list
pub fn builtin_keys(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("keys", ARITY_ONE, args.len()));
    }
    let entries = map_arg("keys", args, 0)?;
    Ok(Value::list(entries.keys().map(MapKey::to_value).collect()))
}

/// All values as a list
pub fn builtin_vals(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("vals", ARITY_ONE, args.len()));
    }
    let entries = map_arg("vals", args, 0)?;
    Ok(Value::list(entries.values().cloned().collect()))
}

/// Register all map builtins in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("hash-map", Value::builtin("hash-map", builtin_hash_map));
    env.set("map?", Value::builtin("map?", builtin_map_p));
    env.set("assoc", Value::builtin("assoc", builtin_assoc));
    env.set("dissoc", Value::builtin("dissoc", builtin_dissoc));
    env.set("get", Value::builtin("get", builtin_get));
    env.set("contains?", Value::builtin("contains?", builtin_contains_p));
    env.set("keys", Value::builtin("keys", builtin_keys));
    env.set("vals", Value::builtin("vals", builtin_vals));
}

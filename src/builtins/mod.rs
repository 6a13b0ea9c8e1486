//! # Built-in Functions Module
//!
//! The native function library, organized by category. Each sub-module
//! exposes a `register` function that installs its bindings into an
//! environment.
//!
//! - **[arithmetic]**: `+`, `-`, `*`, `/`
//! - **[comparison]**: `=`, `<`, `<=`, `>`, `>=`
//! - **[sequences]**: `list`, `vector`, `cons`, `concat`, `vec`, `nth`,
//!   `first`, `rest`, `count`, `empty?`, `apply`, `map` and the sequence
//!   predicates
//! - **[maps]**: `hash-map`, `assoc`, `dissoc`, `get`, `contains?`,
//!   `keys`, `vals`, `map?`
//! - **[types]**: scalar predicates and the `symbol`/`keyword`
//!   constructors
//! - **[strings]**: `pr-str`, `str`, `read-string`
//! - **[console]**: `prn`, `println`
//! - **[filesystem]**: `slurp`
//! - **[atoms]**: `atom`, `atom?`, `deref`, `reset!`, `swap!`
//! - **[errors]**: `throw`
//! - **[meta]**: `with-meta`, `meta`

use crate::config;
use crate::env::Environment;
use crate::error::{EvalError, ARITY_ONE};
use crate::reader::read_str;
use crate::value::Value;
use std::rc::Rc;

pub mod arithmetic;
pub mod atoms;
pub mod comparison;
pub mod console;
pub mod errors;
pub mod filesystem;
pub mod maps;
pub mod meta;
pub mod sequences;
pub mod strings;
pub mod types;

/// Registers every built-in function in the environment. The environment
/// handed in becomes the root that the injected `eval` builtin evaluates
/// against, so call this once per interpreter instance.
pub fn register_builtins(env: &Rc<Environment>) {
    arithmetic::register(env);
    comparison::register(env);
    sequences::register(env);
    maps::register(env);
    types::register(env);
    strings::register(env);
    console::register(env);
    filesystem::register(env);
    atoms::register(env);
    errors::register(env);
    meta::register(env);

    // `eval` runs its argument against the root environment captured here,
    // not against the caller's lexical scope.
    let root = env.clone();
    env.set(
        "eval",
        Value::builtin("eval", move |args: &[Value]| {
            if args.len() != 1 {
                return Err(EvalError::arity_error("eval", ARITY_ONE, args.len()));
            }
            crate::eval::eval(args[0].clone(), root.clone())
        }),
    );
}

/// Builds a fresh root environment: all builtins, an empty `*ARGV*`, and
/// the prelude (`not`, `load-file`, `cond`) evaluated in order.
pub fn new_root_env() -> Result<Rc<Environment>, EvalError> {
    let env = Environment::new();
    register_builtins(&env);
    env.set("*ARGV*", Value::list(Vec::new()));

    for form in config::PRELUDE {
        if let Some(ast) = read_str(form)? {
            crate::eval::eval(ast, env.clone())?;
        }
    }

    Ok(env)
}

//! File access: slurp
//!
//! `slurp` reads a whole file into a string. `std::fs::read_to_string`
//! closes the descriptor on every exit path, success or error.

use crate::env::Environment;
use crate::error::{EvalError, ARITY_ONE};
use crate::value::Value;
use std::rc::Rc;

pub fn builtin_slurp(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity_error("slurp", ARITY_ONE, args.len()));
    }
    let path = match &args[0] {
        Value::Str(s) => s,
        other => return Err(EvalError::type_error("slurp", "string", other, 1)),
    };

    std::fs::read_to_string(path)
        .map(Value::Str)
        .map_err(|err| EvalError::Io(format!("slurp: cannot read {path}: {err}")))
}

/// Register all filesystem builtins in the environment
pub fn register(env: &Rc<Environment>) {
    env.set("slurp", Value::builtin("slurp", builtin_slurp));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_slurp_reads_whole_file() {
        let path = std::env::temp_dir().join(format!("mallow_slurp_test_{}", std::process::id()));
        fs::write(&path, "(+ 1 2)\n").unwrap();

        let result = builtin_slurp(&[Value::Str(path.display().to_string())]).unwrap();
        assert_eq!(result, Value::Str("(+ 1 2)\n".to_string()));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_slurp_missing_file_is_io_error() {
        let result = builtin_slurp(&[Value::Str("/no/such/mallow/file".to_string())]);
        assert!(matches!(result, Err(EvalError::Io(_))));
    }

    #[test]
    fn test_slurp_requires_string() {
        assert!(builtin_slurp(&[Value::Int(1)]).is_err());
        assert!(builtin_slurp(&[]).is_err());
    }
}

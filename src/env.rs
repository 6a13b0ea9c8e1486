// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    outer: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new root environment with no outer frame
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: None,
        })
    }

    /// Creates a new child environment chained to an outer frame
    pub fn with_outer(outer: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            outer: Some(outer),
        })
    }

    /// Inserts or overwrites a binding in THIS frame (never walks outward)
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Looks up a symbol in this frame and then along the outer chain
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }

        let mut frame = self.outer.clone();
        while let Some(env) = frame {
            if let Some(value) = env.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            frame = env.outer.clone();
        }

        None
    }

    /// Creates a child frame binding `params` to `args`.
    ///
    /// A `&` token makes the following parameter collect the remaining
    /// arguments as a (possibly empty) list. Without `&` the arity must
    /// match exactly; `fn*` guarantees `&` is second-to-last.
    pub fn bind(
        outer: Rc<Environment>,
        params: &[String],
        args: &[Value],
    ) -> Result<Rc<Self>, EvalError> {
        let env = Environment::with_outer(outer);
        for (position, param) in params.iter().enumerate() {
            if param == "&" {
                let rest = args.get(position..).unwrap_or(&[]).to_vec();
                env.set(params[position + 1].clone(), Value::list(rest));
                return Ok(env);
            }
            match args.get(position) {
                Some(arg) => env.set(param.clone(), arg.clone()),
                None => {
                    return Err(EvalError::arity_error(
                        "#<function>",
                        expected_arity(params),
                        args.len(),
                    ))
                }
            }
        }
        if args.len() != params.len() {
            return Err(EvalError::arity_error(
                "#<function>",
                expected_arity(params),
                args.len(),
            ));
        }
        Ok(env)
    }
}

fn expected_arity(params: &[String]) -> String {
    match params.iter().position(|p| p == "&") {
        Some(fixed) => format!("at least {fixed}"),
        None => params.len().to_string(),
    }
}

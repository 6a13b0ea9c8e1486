// ABOUTME: Evaluator with a tail-call loop, special forms, and macro expansion

use crate::env::Environment;
use crate::error::{EvalError, ARITY_ONE, ARITY_ONE_OR_TWO, ARITY_TWO_OR_THREE};
use crate::value::{Closure, Value};
use std::collections::HashMap;
use std::rc::Rc;

/// Evaluates an expression. The loop runs one iteration per tail position:
/// `let*`, `do`, `if` branches, `quasiquote` results, `try*` handlers and
/// closure bodies rewrite `(ast, env)` and continue instead of recursing,
/// so self-recursive programs of arbitrary depth never grow the native
/// stack. Subexpressions (arguments, conditions, `def!` values) recurse.
pub fn eval(ast: Value, env: Rc<Environment>) -> Result<Value, EvalError> {
    let mut ast = ast;
    let mut env = env;

    loop {
        ast = macroexpand(ast, &env)?;

        let items = match &ast {
            Value::List(items, _) => Rc::clone(items),
            _ => return eval_ast(&ast, &env),
        };
        if items.is_empty() {
            return Ok(ast);
        }

        if let Value::Symbol(head) = &items[0] {
            match head.as_str() {
                "def!" => return apply_def(&items[1..], &env, false),
                "defmacro!" => return apply_def(&items[1..], &env, true),
                "let*" => {
                    let (body, child) = apply_let(&items[1..], &env)?;
                    ast = body;
                    env = child;
                    continue;
                }
                "do" => {
                    if items.len() == 1 {
                        return Ok(Value::Nil);
                    }
                    for form in &items[1..items.len() - 1] {
                        eval(form.clone(), env.clone())?;
                    }
                    ast = items[items.len() - 1].clone();
                    continue;
                }
                "if" => {
                    ast = apply_if(&items[1..], &env)?;
                    continue;
                }
                "fn*" => return apply_fn(&items[1..], &env),
                "quote" => {
                    expect_args("quote", &items[1..], 1)?;
                    return Ok(items[1].clone());
                }
                "quasiquote" => {
                    expect_args("quasiquote", &items[1..], 1)?;
                    ast = quasiquote(&items[1])?;
                    continue;
                }
                "quasiquoteexpand" => {
                    expect_args("quasiquoteexpand", &items[1..], 1)?;
                    return quasiquote(&items[1]);
                }
                "macroexpand" => {
                    expect_args("macroexpand", &items[1..], 1)?;
                    return macroexpand(items[1].clone(), &env);
                }
                "try*" => match apply_try(&items[1..], &env)? {
                    TryOutcome::Done(value) => return Ok(value),
                    TryOutcome::Handle(handler, child) => {
                        ast = handler;
                        env = child;
                        continue;
                    }
                },
                _ => {}
            }
        }

        // Function application: head and arguments evaluate left-to-right
        let func = eval(items[0].clone(), env.clone())?;
        let mut args = Vec::with_capacity(items.len() - 1);
        for form in &items[1..] {
            args.push(eval(form.clone(), env.clone())?);
        }

        match func {
            Value::Builtin(builtin) => return (builtin.func)(&args),
            Value::Closure(closure) => {
                env = Environment::bind(closure.env.clone(), &closure.params, &args)?;
                ast = closure.body.clone();
            }
            other => return Err(EvalError::NotCallable(other.type_name().to_string())),
        }
    }
}

/// Invokes a function value with already-evaluated arguments. Used by the
/// evaluator indirectly through builtins such as `apply`, `map`, and
/// `swap!`.
pub fn call_function(func: &Value, args: &[Value]) -> Result<Value, EvalError> {
    match func {
        Value::Builtin(builtin) => (builtin.func)(args),
        Value::Closure(closure) => {
            let child = Environment::bind(closure.env.clone(), &closure.params, args)?;
            eval(closure.body.clone(), child)
        }
        other => Err(EvalError::NotCallable(other.type_name().to_string())),
    }
}

/// Structural evaluation for non-list values: symbols look up, vectors and
/// map values evaluate element-wise (map keys are scalars and stay as
/// they are), everything else is self-evaluating.
fn eval_ast(ast: &Value, env: &Rc<Environment>) -> Result<Value, EvalError> {
    match ast {
        Value::Symbol(name) => env
            .get(name)
            .ok_or_else(|| EvalError::SymbolNotFound(name.clone())),
        Value::Vector(items, _) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items.iter() {
                out.push(eval(item.clone(), env.clone())?);
            }
            Ok(Value::vector(out))
        }
        Value::Map(entries, _) => {
            let mut out = HashMap::with_capacity(entries.len());
            for (key, val) in entries.iter() {
                out.insert(key.clone(), eval(val.clone(), env.clone())?);
            }
            Ok(Value::map(out))
        }
        _ => Ok(ast.clone()),
    }
}

/// Repeatedly expands `ast` while it is a call to a macro closure. The
/// macro runs on the unevaluated argument forms and its result replaces
/// the call site. Expansion is unbounded; a cycle is a user error.
pub fn macroexpand(mut ast: Value, env: &Rc<Environment>) -> Result<Value, EvalError> {
    while let Some(closure) = as_macro_call(&ast, env) {
        let args = match &ast {
            Value::List(items, _) => items[1..].to_vec(),
            _ => unreachable!("as_macro_call only matches lists"),
        };
        let child = Environment::bind(closure.env.clone(), &closure.params, &args)?;
        ast = eval(closure.body.clone(), child)?;
    }
    Ok(ast)
}

fn as_macro_call(ast: &Value, env: &Rc<Environment>) -> Option<Rc<Closure>> {
    let Value::List(items, _) = ast else {
        return None;
    };
    let Value::Symbol(name) = items.first()? else {
        return None;
    };
    match env.get(name) {
        Some(Value::Closure(closure)) if closure.is_macro => Some(closure),
        _ => None,
    }
}

/// The quasiquote rewrite: a pure AST-to-AST transform built from `cons`
/// and `concat` calls, folding the sequence right-to-left. Vectors get a
/// `vec` wrapper; symbols and maps are quoted; scalars pass through.
pub fn quasiquote(ast: &Value) -> Result<Value, EvalError> {
    match ast {
        Value::List(items, _) => {
            if let [Value::Symbol(head), rest @ ..] = items.as_slice() {
                if head == "unquote" {
                    return match rest {
                        [form] => Ok(form.clone()),
                        _ => Err(EvalError::arity_error("unquote", ARITY_ONE, rest.len())),
                    };
                }
            }
            quasiquote_seq(items.as_slice())
        }
        Value::Vector(items, _) => Ok(Value::list(vec![
            Value::symbol("vec"),
            quasiquote_seq(items.as_slice())?,
        ])),
        Value::Symbol(_) | Value::Map(_, _) => {
            Ok(Value::list(vec![Value::symbol("quote"), ast.clone()]))
        }
        _ => Ok(ast.clone()),
    }
}

fn quasiquote_seq(elements: &[Value]) -> Result<Value, EvalError> {
    let mut acc = Value::list(Vec::new());
    for element in elements.iter().rev() {
        if let Value::List(parts, _) = element {
            if let [Value::Symbol(head), rest @ ..] = parts.as_slice() {
                if head == "splice-unquote" {
                    match rest {
                        [form] => {
                            acc = Value::list(vec![
                                Value::symbol("concat"),
                                form.clone(),
                                acc,
                            ]);
                            continue;
                        }
                        _ => {
                            return Err(EvalError::arity_error(
                                "splice-unquote",
                                ARITY_ONE,
                                rest.len(),
                            ))
                        }
                    }
                }
            }
        }
        acc = Value::list(vec![Value::symbol("cons"), quasiquote(element)?, acc]);
    }
    Ok(acc)
}

fn expect_args(form: &str, args: &[Value], count: usize) -> Result<(), EvalError> {
    if args.len() != count {
        return Err(EvalError::arity_error(form, count.to_string(), args.len()));
    }
    Ok(())
}

/// `def!` and `defmacro!`. The macro variant requires the value to be a
/// closure and binds a copy with `is_macro` set; the original closure is
/// left untouched.
fn apply_def(args: &[Value], env: &Rc<Environment>, as_macro: bool) -> Result<Value, EvalError> {
    let form = if as_macro { "defmacro!" } else { "def!" };
    expect_args(form, args, 2)?;

    let name = match &args[0] {
        Value::Symbol(s) => s.clone(),
        other => return Err(EvalError::type_error(form, "symbol", other, 1)),
    };

    let value = eval(args[1].clone(), env.clone())?;
    let value = if as_macro {
        match value {
            Value::Closure(c) => Value::Closure(Rc::new(Closure {
                params: c.params.clone(),
                body: c.body.clone(),
                env: c.env.clone(),
                is_macro: true,
                meta: c.meta.clone(),
            })),
            other => return Err(EvalError::type_error(form, "function", &other, 2)),
        }
    } else {
        value
    };

    env.set(name, value.clone());
    Ok(value)
}

/// `let*`: alternating symbol/expression bindings evaluated left-to-right
/// in the child frame, so later bindings see earlier ones. Returns the
/// body and the child env for the tail rewrite.
fn apply_let(args: &[Value], env: &Rc<Environment>) -> Result<(Value, Rc<Environment>), EvalError> {
    expect_args("let*", args, 2)?;

    let bindings = args[0]
        .as_seq()
        .ok_or_else(|| EvalError::type_error("let*", "binding sequence", &args[0], 1))?;
    if bindings.len() % 2 != 0 {
        return Err(EvalError::runtime_error(
            "let*",
            format!(
                "expected an even number of binding forms, got {}",
                bindings.len()
            ),
        ));
    }

    let child = Environment::with_outer(env.clone());
    for pair in bindings.chunks(2) {
        let name = match &pair[0] {
            Value::Symbol(s) => s.clone(),
            other => return Err(EvalError::type_error("let*", "symbol", other, 1)),
        };
        let bound = eval(pair[1].clone(), child.clone())?;
        child.set(name, bound);
    }

    Ok((args[1].clone(), child))
}

/// `if`: picks the branch to continue the loop with; a false/nil condition
/// with no else branch yields nil.
fn apply_if(args: &[Value], env: &Rc<Environment>) -> Result<Value, EvalError> {
    if args.len() < 2 || args.len() > 3 {
        return Err(EvalError::arity_error("if", ARITY_TWO_OR_THREE, args.len()));
    }
    let condition = eval(args[0].clone(), env.clone())?;
    if condition.is_truthy() {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(Value::Nil))
    }
}

/// `fn*`: validates the parameter sequence (symbols only, a single `&`
/// allowed in second-to-last position) and captures the defining env.
fn apply_fn(args: &[Value], env: &Rc<Environment>) -> Result<Value, EvalError> {
    expect_args("fn*", args, 2)?;

    let param_forms = args[0]
        .as_seq()
        .ok_or_else(|| EvalError::type_error("fn*", "parameter sequence", &args[0], 1))?;
    let mut params = Vec::with_capacity(param_forms.len());
    for form in param_forms {
        match form {
            Value::Symbol(s) => params.push(s.clone()),
            other => return Err(EvalError::type_error("fn*", "symbol", other, 1)),
        }
    }
    if let Some(position) = params.iter().position(|p| p == "&") {
        if position + 2 != params.len() {
            return Err(EvalError::runtime_error(
                "fn*",
                "`&` must be followed by exactly one rest parameter",
            ));
        }
    }

    Ok(Value::Closure(Rc::new(Closure {
        params,
        body: args[1].clone(),
        env: env.clone(),
        is_macro: false,
        meta: Value::Nil,
    })))
}

enum TryOutcome {
    Done(Value),
    Handle(Value, Rc<Environment>),
}

/// `try*`: on error, binds the raised value (host errors as their message
/// string) to the catch symbol in a child env and hands the handler back
/// for tail evaluation. Without a catch clause errors propagate.
fn apply_try(args: &[Value], env: &Rc<Environment>) -> Result<TryOutcome, EvalError> {
    if args.is_empty() || args.len() > 2 {
        return Err(EvalError::arity_error("try*", ARITY_ONE_OR_TWO, args.len()));
    }

    let raised = match eval(args[0].clone(), env.clone()) {
        Ok(value) => return Ok(TryOutcome::Done(value)),
        Err(err) => err,
    };
    let Some(clause) = args.get(1) else {
        return Err(raised);
    };

    let clause_items = match clause {
        Value::List(items, _) => items,
        other => return Err(EvalError::type_error("try*", "catch* clause", other, 2)),
    };
    match clause_items.as_slice() {
        [Value::Symbol(catch), Value::Symbol(name), handler] if catch == "catch*" => {
            let bound = match raised {
                EvalError::Thrown(value) => value,
                host => Value::Str(host.to_string()),
            };
            let child = Environment::with_outer(env.clone());
            child.set(name.clone(), bound);
            Ok(TryOutcome::Handle(handler.clone(), child))
        }
        _ => Err(EvalError::runtime_error(
            "try*",
            "expected a (catch* symbol handler) clause",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtins;
    use crate::printer::pr_str;
    use crate::reader::read_str;

    fn setup() -> Rc<Environment> {
        let env = Environment::new();
        register_builtins(&env);
        env
    }

    fn eval_str(input: &str, env: &Rc<Environment>) -> Result<Value, EvalError> {
        let ast = read_str(input).unwrap().unwrap();
        eval(ast, env.clone())
    }

    fn rep(input: &str, env: &Rc<Environment>) -> String {
        pr_str(&eval_str(input, env).unwrap(), true)
    }

    #[test]
    fn test_eval_self_evaluating() {
        let env = setup();
        assert_eq!(rep("42", &env), "42");
        assert_eq!(rep("nil", &env), "nil");
        assert_eq!(rep("\"s\"", &env), "\"s\"");
        assert_eq!(rep(":k", &env), ":k");
        assert_eq!(rep("()", &env), "()");
    }

    #[test]
    fn test_eval_symbol_lookup() {
        let env = setup();
        env.set("x", Value::Int(9));
        assert_eq!(rep("x", &env), "9");

        let err = eval_str("missing", &env).unwrap_err();
        assert_eq!(err.to_string(), "symbol 'missing' not found");
    }

    #[test]
    fn test_eval_vector_and_map_contents() {
        let env = setup();
        assert_eq!(rep("[(+ 1 2) 4]", &env), "[3 4]");
        assert_eq!(rep("{:a (+ 1 2)}", &env), "{:a 3}");
    }

    #[test]
    fn test_def_binds_and_returns() {
        let env = setup();
        assert_eq!(rep("(def! x (+ 1 2))", &env), "3");
        assert_eq!(rep("x", &env), "3");
    }

    #[test]
    fn test_let_bindings_see_earlier_ones() {
        let env = setup();
        assert_eq!(rep("(let* (a 1 b (+ a 1)) (* a b))", &env), "2");
    }

    #[test]
    fn test_let_binding_invisible_after_body() {
        let env = setup();
        rep("(def! a 7)", &env);
        assert_eq!(rep("(let* (a 1) a)", &env), "1");
        assert_eq!(rep("a", &env), "7");
    }

    #[test]
    fn test_let_odd_bindings_error() {
        let env = setup();
        assert!(eval_str("(let* (a) a)", &env).is_err());
    }

    #[test]
    fn test_do_sequencing() {
        let env = setup();
        assert_eq!(rep("(do)", &env), "nil");
        assert_eq!(rep("(do 1 2 3)", &env), "3");
        rep("(do (def! side 1) (def! side 2))", &env);
        assert_eq!(rep("side", &env), "2");
    }

    #[test]
    fn test_if_branches() {
        let env = setup();
        assert_eq!(rep("(if true 1 2)", &env), "1");
        assert_eq!(rep("(if false 1 2)", &env), "2");
        assert_eq!(rep("(if nil 1 2)", &env), "2");
        assert_eq!(rep("(if 0 1 2)", &env), "1");
        assert_eq!(rep("(if false 1)", &env), "nil");
    }

    #[test]
    fn test_fn_call_and_closure_capture() {
        let env = setup();
        assert_eq!(rep("((fn* (a b) (+ a b)) 2 3)", &env), "5");
        rep("(def! make-adder (fn* (n) (fn* (x) (+ x n))))", &env);
        rep("(def! add5 (make-adder 5))", &env);
        assert_eq!(rep("(add5 37)", &env), "42");
    }

    #[test]
    fn test_fn_variadic() {
        let env = setup();
        assert_eq!(rep("((fn* (a & rest) rest) 1 2 3)", &env), "(2 3)");
        assert_eq!(rep("((fn* (a & rest) rest) 1)", &env), "()");
        assert!(eval_str("((fn* (a & rest) rest))", &env).is_err());
    }

    #[test]
    fn test_fn_arity_errors() {
        let env = setup();
        assert!(eval_str("((fn* (a b) a) 1)", &env).is_err());
        assert!(eval_str("((fn* (a b) a) 1 2 3)", &env).is_err());
    }

    #[test]
    fn test_fn_rejects_misplaced_amp() {
        let env = setup();
        assert!(eval_str("(fn* (& a b) a)", &env).is_err());
        assert!(eval_str("(fn* (a &) a)", &env).is_err());
    }

    #[test]
    fn test_tail_call_depth() {
        let env = setup();
        rep(
            "(def! countdown (fn* (n) (if (= n 0) :done (countdown (- n 1)))))",
            &env,
        );
        assert_eq!(rep("(countdown 10000)", &env), ":done");
    }

    #[test]
    fn test_quote() {
        let env = setup();
        assert_eq!(rep("(quote (+ 1 2))", &env), "(+ 1 2)");
        assert_eq!(rep("'(1 2 3)", &env), "(1 2 3)");
    }

    #[test]
    fn test_quasiquote_eval() {
        let env = setup();
        assert_eq!(rep("`(1 ~(+ 1 1) ~@(list 3 4))", &env), "(1 2 3 4)");
        assert_eq!(rep("`[1 ~(+ 1 1)]", &env), "[1 2]");
        assert_eq!(rep("`abc", &env), "abc");
        assert_eq!(rep("`7", &env), "7");
    }

    #[test]
    fn test_quasiquoteexpand_returns_transform() {
        let env = setup();
        assert_eq!(
            rep("(quasiquoteexpand (1 ~a))", &env),
            "(cons 1 (cons a ()))"
        );
    }

    #[test]
    fn test_quasiquote_argument_errors() {
        let env = setup();
        assert!(eval_str("`((unquote))", &env).is_err());
        assert!(eval_str("(quasiquoteexpand (unquote 1 2))", &env).is_err());
        assert!(eval_str("`((splice-unquote 1 2))", &env).is_err());
    }

    #[test]
    fn test_macro_expands_eagerly() {
        let env = setup();
        rep("(defmacro! m (fn* (x) (list 'quote x)))", &env);
        assert_eq!(rep("(m (+ 1 2))", &env), "(+ 1 2)");
    }

    #[test]
    fn test_macroexpand_special_form() {
        let env = setup();
        rep("(defmacro! unless (fn* (p a b) (list 'if p b a)))", &env);
        assert_eq!(
            rep("(macroexpand (unless c 1 2))", &env),
            "(if c 2 1)"
        );
        assert_eq!(rep("(unless false 1 2)", &env), "1");
    }

    #[test]
    fn test_defmacro_leaves_original_closure_alone() {
        let env = setup();
        rep("(def! f (fn* (x) x))", &env);
        rep("(defmacro! m f)", &env);
        // f is still a plain function: its argument evaluates
        assert_eq!(rep("(f (+ 1 2))", &env), "3");
        assert_eq!(rep("(m (+ 1 2))", &env), "3");
    }

    #[test]
    fn test_try_catches_thrown_value() {
        let env = setup();
        assert_eq!(rep("(try* (throw :oops) (catch* e e))", &env), ":oops");
        assert_eq!(
            rep("(try* (throw {\"msg\" \"boom\"}) (catch* e (get e \"msg\")))", &env),
            "\"boom\""
        );
    }

    #[test]
    fn test_try_binds_host_error_as_string() {
        let env = setup();
        assert_eq!(
            rep("(try* missing (catch* e e))", &env),
            "\"symbol 'missing' not found\""
        );
    }

    #[test]
    fn test_try_without_catch_propagates() {
        let env = setup();
        let err = eval_str("(try* (throw 1))", &env).unwrap_err();
        assert!(matches!(err, EvalError::Thrown(Value::Int(1))));
    }

    #[test]
    fn test_try_success_skips_handler() {
        let env = setup();
        assert_eq!(rep("(try* 7 (catch* e :handled))", &env), "7");
    }

    #[test]
    fn test_calling_non_callable() {
        let env = setup();
        let err = eval_str("(1 2 3)", &env).unwrap_err();
        assert_eq!(err.to_string(), "cannot call object of type integer");
    }

    #[test]
    fn test_argument_evaluation_order() {
        let env = setup();
        rep("(def! trace (atom ()))", &env);
        rep("(def! note (fn* (x) (do (swap! trace (fn* (t) (cons x t))) x)))", &env);
        rep("(+ (note 1) (note 2) (note 3))", &env);
        // cons prepends, so the most recent note is first
        assert_eq!(rep("@trace", &env), "(3 2 1)");
    }
}

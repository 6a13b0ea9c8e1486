// ABOUTME: Driver binary: CLI handling, script mode, and the REPL loop

use clap::Parser;
use mallow::builtins::new_root_env;
use mallow::config::{HISTORY_FILE, PROMPT, VERSION, WELCOME_MESSAGE};
use mallow::env::Environment;
use mallow::error::EvalError;
use mallow::eval::eval;
use mallow::highlighter::LispHelper;
use mallow::printer::pr_str;
use mallow::reader::read_str;
use mallow::value::Value;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::rc::Rc;

/// MAL-family Lisp interpreter
#[derive(Parser, Debug)]
#[command(name = "mallow")]
#[command(version = VERSION)]
#[command(about = "A MAL-family Lisp interpreter")]
struct CliArgs {
    /// Script file to execute (starts the REPL when omitted)
    #[arg(value_name = "FILE")]
    script: Option<String>,

    /// Arguments exposed to the script as *ARGV*
    #[arg(value_name = "ARGS", trailing_var_arg = true)]
    script_args: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();
    let env = new_root_env()?;

    if let Some(script) = args.script {
        let argv = args
            .script_args
            .iter()
            .map(|arg| Value::Str(arg.clone()))
            .collect();
        env.set("*ARGV*", Value::list(argv));

        if let Err(err) = run_script(&script, &env) {
            eprintln!("{err}");
            std::process::exit(1);
        }
        return Ok(());
    }

    repl(env)
}

/// Evaluates `(load-file "<path>")`. The call is built as a value rather
/// than formatted source, so paths need no escaping.
fn run_script(path: &str, env: &Rc<Environment>) -> Result<(), EvalError> {
    let call = Value::list(vec![
        Value::symbol("load-file"),
        Value::Str(path.to_string()),
    ]);
    eval(call, env.clone()).map(|_| ())
}

fn repl(env: Rc<Environment>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<LispHelper, DefaultHistory> = Editor::with_config(config)?;
    rl.set_helper(Some(LispHelper));
    let _ = rl.load_history(HISTORY_FILE);

    println!("{WELCOME_MESSAGE}");

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => match rep(&line, &env) {
                Ok(Some(output)) => println!("{output}"),
                Ok(None) => {} // blank or comment-only line
                Err(err) => eprintln!("Error: {err}"),
            },
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    let _ = rl.save_history(HISTORY_FILE);
    Ok(())
}

/// One read-eval-print round
fn rep(line: &str, env: &Rc<Environment>) -> Result<Option<String>, EvalError> {
    let Some(ast) = read_str(line)? else {
        return Ok(None);
    };
    let result = eval(ast, env.clone())?;
    Ok(Some(pr_str(&result, true)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rep_round() {
        let env = new_root_env().unwrap();
        assert_eq!(rep("(+ 1 2 3)", &env).unwrap(), Some("6".to_string()));
        assert_eq!(rep("", &env).unwrap(), None);
        assert_eq!(rep("; nothing", &env).unwrap(), None);
    }

    #[test]
    fn test_rep_reports_errors() {
        let env = new_root_env().unwrap();
        assert!(rep("(1 2", &env).is_err());
        assert!(rep("(nope)", &env).is_err());
    }

    #[test]
    fn test_run_script_loads_file() {
        let env = new_root_env().unwrap();
        let path = std::env::temp_dir().join(format!("mallow_script_{}.mal", std::process::id()));
        std::fs::write(&path, "(def! answer (* 6 7))").unwrap();

        run_script(&path.display().to_string(), &env).unwrap();
        assert_eq!(rep("answer", &env).unwrap(), Some("42".to_string()));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_run_script_missing_file_errors() {
        let env = new_root_env().unwrap();
        assert!(run_script("/no/such/mallow/script.mal", &env).is_err());
    }
}

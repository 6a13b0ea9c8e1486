// ABOUTME: Configuration and constants for the interpreter
// Version info, REPL strings, and the prelude evaluated into every fresh
// root environment.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PROMPT: &str = "user> ";
pub const HISTORY_FILE: &str = ".mallow_history";
pub const WELCOME_MESSAGE: &str = "mallow — a MAL-family Lisp. Ctrl-D exits.";

/// Forms evaluated in order before any user input. `load-file` wraps the
/// slurped source in `(do … nil)` so a script reads as a single form.
pub const PRELUDE: &[&str] = &[
    "(def! not (fn* (a) (if a false true)))",
    r#"(def! load-file (fn* (f) (eval (read-string (str "(do " (slurp f) "\nnil)")))))"#,
    r#"(defmacro! cond (fn* (& xs) (if (> (count xs) 0) (list 'if (first xs) (if (> (count xs) 1) (nth xs 1) (throw "odd number of forms to cond")) (cons 'cond (rest (rest xs)))))))"#,
];

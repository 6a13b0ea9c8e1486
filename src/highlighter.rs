// ABOUTME: Syntax highlighter for the REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for the language's syntax while preserving display width

use rustyline::highlight::{CmdKind, Highlighter};
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow;
use std::collections::HashSet;

// ANSI color codes (3-bit/4-bit colors for maximum terminal compatibility)
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m"; // Bold blue
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_BUILTIN: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_LITERAL: &str = "\x1b[33m"; // Yellow: nil, true, false
const COLOR_KEYWORD: &str = "\x1b[36m"; // Cyan
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)
const COLOR_QUOTE: &str = "\x1b[1;33m"; // Bold yellow: ' ` ~ ~@ @ ^

/// rustyline helper providing syntax-aware highlighting of the input line
#[derive(Completer, Helper, Hinter, Validator)]
pub struct LispHelper;

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let special_forms = special_forms();
        let builtins = builtin_names();

        let highlighted = highlight_line(line, &special_forms, &builtins);
        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true // re-highlight on every edit
    }
}

fn is_symbol_terminator(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';' | '\'' | '`' | '~' | '@' | '^' | ','
        )
}

/// Tokenize a line and apply syntax highlighting
fn highlight_line(
    line: &str,
    special_forms: &HashSet<&'static str>,
    builtins: &HashSet<&'static str>,
) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            // Comments: everything to end of line
            ';' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Strings: preserve exact content but colorize
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;

                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
                result.push_str(COLOR_RESET);
            }

            // Keywords: :name
            ':' => {
                let start = i;
                i += 1;
                while i < chars.len() && !is_symbol_terminator(chars[i]) {
                    i += 1;
                }
                let keyword: String = chars[start..i].iter().collect();
                result.push_str(COLOR_KEYWORD);
                result.push_str(&keyword);
                result.push_str(COLOR_RESET);
            }

            // Integer literals
            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let number: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&number);
                result.push_str(COLOR_RESET);
            }

            // Signed numbers or symbols starting with +/-
            '+' | '-' => {
                if i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                    let start = i;
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                    let number: String = chars[start..i].iter().collect();
                    result.push_str(COLOR_NUMBER);
                    result.push_str(&number);
                    result.push_str(COLOR_RESET);
                } else {
                    i = push_symbol(&mut result, &chars, i, special_forms, builtins);
                }
            }

            // Reader macros: ' ` ~ ~@ @ ^
            '\'' | '`' | '^' | '@' => {
                result.push_str(COLOR_QUOTE);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }
            '~' => {
                result.push_str(COLOR_QUOTE);
                result.push('~');
                i += 1;
                if i < chars.len() && chars[i] == '@' {
                    result.push('@');
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            // Delimiters
            '(' | ')' | '[' | ']' | '{' | '}' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            // Whitespace (comma included)
            c if c.is_whitespace() || c == ',' => {
                result.push(chars[i]);
                i += 1;
            }

            // Symbols and literals
            _ => {
                i = push_symbol(&mut result, &chars, i, special_forms, builtins);
            }
        }
    }

    result
}

/// Consumes one symbol run starting at `start`, classifies it, and appends
/// the colored text. Returns the index past the symbol.
fn push_symbol(
    result: &mut String,
    chars: &[char],
    start: usize,
    special_forms: &HashSet<&'static str>,
    builtins: &HashSet<&'static str>,
) -> usize {
    let mut end = start;
    while end < chars.len() && !is_symbol_terminator(chars[end]) {
        end += 1;
    }
    let symbol: String = chars[start..end].iter().collect();

    if matches!(symbol.as_str(), "nil" | "true" | "false") {
        result.push_str(COLOR_LITERAL);
        result.push_str(&symbol);
        result.push_str(COLOR_RESET);
    } else if special_forms.contains(symbol.as_str()) {
        result.push_str(COLOR_SPECIAL_FORM);
        result.push_str(&symbol);
        result.push_str(COLOR_RESET);
    } else if builtins.contains(symbol.as_str()) {
        result.push_str(COLOR_BUILTIN);
        result.push_str(&symbol);
        result.push_str(COLOR_RESET);
    } else {
        result.push_str(&symbol);
    }

    end
}

/// Symbols with special evaluation semantics
fn special_forms() -> HashSet<&'static str> {
    [
        "def!",
        "defmacro!",
        "let*",
        "do",
        "if",
        "fn*",
        "quote",
        "quasiquote",
        "quasiquoteexpand",
        "unquote",
        "splice-unquote",
        "macroexpand",
        "try*",
        "catch*",
    ]
    .iter()
    .copied()
    .collect()
}

/// Built-in functions and the prelude definitions
fn builtin_names() -> HashSet<&'static str> {
    [
        // Arithmetic
        "+",
        "-",
        "*",
        "/",
        // Comparison
        "=",
        "<",
        "<=",
        ">",
        ">=",
        // Sequences
        "list",
        "list?",
        "vector",
        "vector?",
        "sequential?",
        "empty?",
        "count",
        "cons",
        "concat",
        "vec",
        "nth",
        "first",
        "rest",
        "apply",
        "map",
        // Maps
        "hash-map",
        "map?",
        "assoc",
        "dissoc",
        "get",
        "contains?",
        "keys",
        "vals",
        // Predicates and constructors
        "nil?",
        "true?",
        "false?",
        "symbol?",
        "symbol",
        "keyword",
        "keyword?",
        // Strings and I/O
        "pr-str",
        "str",
        "prn",
        "println",
        "read-string",
        "slurp",
        // Atoms
        "atom",
        "atom?",
        "deref",
        "reset!",
        "swap!",
        // Control and metadata
        "throw",
        "with-meta",
        "meta",
        "eval",
        // Prelude
        "not",
        "load-file",
        "cond",
    ]
    .iter()
    .copied()
    .collect()
}

// ABOUTME: Printer turning Values back into source text

use crate::value::Value;

/// Renders a value. With `readable` set, strings are quoted and `"` `\`
/// and newline are escaped so the output reads back as the same value;
/// otherwise strings are emitted raw (the `str`/`println` family).
pub fn pr_str(value: &Value, readable: bool) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Str(s) => {
            if readable {
                escape(s)
            } else {
                s.clone()
            }
        }
        Value::Keyword(k) => format!(":{k}"),
        Value::Symbol(s) => s.clone(),
        Value::List(items, _) => format!("({})", join(items, readable)),
        Value::Vector(items, _) => format!("[{}]", join(items, readable)),
        Value::Map(entries, _) => {
            let body = entries
                .iter()
                .map(|(key, val)| {
                    format!(
                        "{} {}",
                        pr_str(&key.to_value(), readable),
                        pr_str(val, readable)
                    )
                })
                .collect::<Vec<_>>()
                .join(" ");
            format!("{{{body}}}")
        }
        Value::Builtin(_) | Value::Closure(_) => "#<function>".to_string(),
        Value::Atom(cell) => format!("(atom {})", pr_str(&cell.borrow(), readable)),
    }
}

fn join(items: &[Value], readable: bool) -> String {
    items
        .iter()
        .map(|item| pr_str(item, readable))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_str;

    #[test]
    fn test_print_scalars() {
        assert_eq!(pr_str(&Value::Nil, true), "nil");
        assert_eq!(pr_str(&Value::Bool(true), true), "true");
        assert_eq!(pr_str(&Value::Bool(false), true), "false");
        assert_eq!(pr_str(&Value::Int(-7), true), "-7");
        assert_eq!(pr_str(&Value::Keyword("kw".to_string()), true), ":kw");
        assert_eq!(pr_str(&Value::symbol("abc"), true), "abc");
    }

    #[test]
    fn test_print_string_readable_vs_raw() {
        let s = Value::Str("a\"b\\c\nd".to_string());
        assert_eq!(pr_str(&s, true), r#""a\"b\\c\nd""#);
        assert_eq!(pr_str(&s, false), "a\"b\\c\nd");
    }

    #[test]
    fn test_print_sequences() {
        let list = Value::list(vec![
            Value::Int(1),
            Value::vector(vec![Value::Int(2), Value::Int(3)]),
        ]);
        assert_eq!(pr_str(&list, true), "(1 [2 3])");
        assert_eq!(pr_str(&Value::list(vec![]), true), "()");
    }

    #[test]
    fn test_print_function_and_atom() {
        let f = Value::builtin("id", |args| Ok(args[0].clone()));
        assert_eq!(pr_str(&f, true), "#<function>");
        assert_eq!(pr_str(&Value::atom(Value::Int(5)), true), "(atom 5)");
    }

    #[test]
    fn test_read_print_round_trip() {
        for source in [
            "nil",
            "true",
            "(1 2 3)",
            "[1 [2] 3]",
            "(a :b \"c\\nd\" -4)",
            "{:a (1 2)}",
        ] {
            let value = read_str(source).unwrap().unwrap();
            let printed = pr_str(&value, true);
            let reread = read_str(&printed).unwrap().unwrap();
            assert_eq!(value, reread, "round trip failed for {source}");
        }
    }
}

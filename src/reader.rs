// ABOUTME: Tokenizer and recursive-descent form reader producing Values

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::value,
    IResult, Parser,
};

use crate::error::EvalError;
use crate::value::{MapKey, Value};
use std::collections::HashMap;

/// One lexical token. Strings arrive with their escapes already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Quote,
    Quasiquote,
    Unquote,
    SpliceUnquote,
    Deref,
    WithMeta,
    Str(String),
    Atom(String),
}

/// Whitespace for the tokenizer includes comma
fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Characters that terminate an atom token
fn is_special(c: char) -> bool {
    is_separator(c) || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '\'' | '`' | '^' | '@' | '~' | '"' | ';')
}

fn punctuation(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::SpliceUnquote, tag("~@")),
        value(Token::Unquote, char('~')),
        value(Token::LeftParen, char('(')),
        value(Token::RightParen, char(')')),
        value(Token::LeftBracket, char('[')),
        value(Token::RightBracket, char(']')),
        value(Token::LeftBrace, char('{')),
        value(Token::RightBrace, char('}')),
        value(Token::Quote, char('\'')),
        value(Token::Quasiquote, char('`')),
        value(Token::Deref, char('@')),
        value(Token::WithMeta, char('^')),
    ))
    .parse(input)
}

/// Consumes a string literal starting at the opening quote, decoding the
/// `\"` `\\` `\n` escapes; any other `\x` keeps the backslash.
fn string_token(input: &str) -> Result<(&str, Token), EvalError> {
    let mut chars = input.char_indices();
    chars.next(); // opening quote
    let mut text = String::new();
    let mut escaped = false;

    for (index, c) in chars {
        if escaped {
            match c {
                'n' => text.push('\n'),
                '"' => text.push('"'),
                '\\' => text.push('\\'),
                other => {
                    text.push('\\');
                    text.push(other);
                }
            }
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return Ok((&input[index + 1..], Token::Str(text)));
        } else {
            text.push(c);
        }
    }

    Err(EvalError::ReadError("unbalanced string quotes".to_string()))
}

/// Tokenizes a whole input buffer. A `;` comment discards everything up to
/// the end of the buffer, matching the line-oriented driver.
pub fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let mut rest = input;
    let mut tokens = Vec::new();

    loop {
        let separators: IResult<&str, &str> = take_while(is_separator).parse(rest);
        if let Ok((after, _)) = separators {
            rest = after;
        }

        if rest.is_empty() || rest.starts_with(';') {
            break;
        }

        if rest.starts_with('"') {
            let (after, token) = string_token(rest)?;
            rest = after;
            tokens.push(token);
            continue;
        }

        if let Ok((after, token)) = punctuation(rest) {
            rest = after;
            tokens.push(token);
            continue;
        }

        let atom: IResult<&str, &str> = take_while1(|c: char| !is_special(c)).parse(rest);
        match atom {
            Ok((after, text)) => {
                rest = after;
                tokens.push(Token::Atom(text.to_string()));
            }
            Err(_) => return Err(EvalError::ReadError("invalid token".to_string())),
        }
    }

    Ok(tokens)
}

/// Peekable cursor over the token stream
struct Reader {
    tokens: Vec<Token>,
    position: usize,
}

impl Reader {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }
}

/// Reads one form from the input. `Ok(None)` means the buffer held nothing
/// but whitespace and comments; the driver ignores it. Tokens past the
/// first form are ignored.
pub fn read_str(input: &str) -> Result<Option<Value>, EvalError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Ok(None);
    }
    let mut reader = Reader {
        tokens,
        position: 0,
    };
    read_form(&mut reader).map(Some)
}

fn read_form(reader: &mut Reader) -> Result<Value, EvalError> {
    let token = reader
        .next()
        .ok_or_else(|| EvalError::ReadError("unexpected end of input".to_string()))?;

    match token {
        Token::LeftParen => read_seq(reader, Token::RightParen).map(Value::list),
        Token::LeftBracket => read_seq(reader, Token::RightBracket).map(Value::vector),
        Token::LeftBrace => read_map(reader),
        Token::RightParen => Err(EvalError::ReadError("unexpected ')'".to_string())),
        Token::RightBracket => Err(EvalError::ReadError("unexpected ']'".to_string())),
        Token::RightBrace => Err(EvalError::ReadError("unexpected '}'".to_string())),
        Token::Quote => read_wrapped(reader, "quote"),
        Token::Quasiquote => read_wrapped(reader, "quasiquote"),
        Token::Unquote => read_wrapped(reader, "unquote"),
        Token::SpliceUnquote => read_wrapped(reader, "splice-unquote"),
        Token::Deref => read_wrapped(reader, "deref"),
        Token::WithMeta => {
            let meta = read_form(reader)?;
            let target = read_form(reader)?;
            Ok(Value::list(vec![
                Value::symbol("with-meta"),
                target,
                meta,
            ]))
        }
        Token::Str(text) => Ok(Value::Str(text)),
        Token::Atom(text) => Ok(classify_atom(&text)),
    }
}

/// Reads the next form and wraps it as `(name form)`
fn read_wrapped(reader: &mut Reader, name: &str) -> Result<Value, EvalError> {
    let form = read_form(reader)?;
    Ok(Value::list(vec![Value::symbol(name), form]))
}

fn read_seq(reader: &mut Reader, closer: Token) -> Result<Vec<Value>, EvalError> {
    let mut items = Vec::new();
    loop {
        match reader.peek() {
            Some(token) if *token == closer => {
                reader.next();
                return Ok(items);
            }
            Some(_) => items.push(read_form(reader)?),
            None => return Err(EvalError::ReadError("unbalanced parenthesis".to_string())),
        }
    }
}

fn read_map(reader: &mut Reader) -> Result<Value, EvalError> {
    let mut entries = HashMap::new();
    loop {
        match reader.peek() {
            Some(Token::RightBrace) => {
                reader.next();
                return Ok(Value::map(entries));
            }
            None => return Err(EvalError::ReadError("unbalanced parenthesis".to_string())),
            Some(_) => {}
        }

        let key_form = read_form(reader)?;
        let key = MapKey::from_value(&key_form).ok_or_else(|| {
            EvalError::ReadError(format!(
                "invalid type for hashmap key: {}",
                key_form.type_name()
            ))
        })?;

        match reader.peek() {
            Some(Token::RightBrace) => {
                return Err(EvalError::ReadError(
                    "odd number of forms in map literal".to_string(),
                ))
            }
            None => return Err(EvalError::ReadError("unbalanced parenthesis".to_string())),
            Some(_) => {}
        }

        let value_form = read_form(reader)?;
        entries.insert(key, value_form);
    }
}

fn classify_atom(text: &str) -> Value {
    if let Some(name) = text.strip_prefix(':') {
        return Value::Keyword(name.to_string());
    }
    match text {
        "nil" => return Value::Nil,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    Value::Symbol(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(input: &str) -> Value {
        read_str(input).unwrap().unwrap()
    }

    #[test]
    fn test_tokenize_punctuation() {
        let tokens = tokenize("(~@ ~ @ ^)").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::LeftParen,
                Token::SpliceUnquote,
                Token::Unquote,
                Token::Deref,
                Token::WithMeta,
                Token::RightParen,
            ]
        );
    }

    #[test]
    fn test_tokenize_comma_is_whitespace() {
        let tokens = tokenize("1,,2").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Atom("1".to_string()), Token::Atom("2".to_string())]
        );
    }

    #[test]
    fn test_tokenize_comment_discards_rest() {
        let tokens = tokenize("1 ; everything after is gone\n2").unwrap();
        assert_eq!(tokens, vec![Token::Atom("1".to_string())]);
    }

    #[test]
    fn test_tokenize_string_escapes() {
        let tokens = tokenize(r#""a\nb\"c\\d\qe""#).unwrap();
        assert_eq!(tokens, vec![Token::Str("a\nb\"c\\d\\qe".to_string())]);
    }

    #[test]
    fn test_tokenize_unbalanced_string() {
        assert!(tokenize(r#""no closing"#).is_err());
        assert!(tokenize(r#""trailing escape\"#).is_err());
    }

    #[test]
    fn test_read_scalars() {
        assert_eq!(read("42"), Value::Int(42));
        assert_eq!(read("-42"), Value::Int(-42));
        assert_eq!(read("+7"), Value::Int(7));
        assert_eq!(read("nil"), Value::Nil);
        assert_eq!(read("true"), Value::Bool(true));
        assert_eq!(read("false"), Value::Bool(false));
        assert_eq!(read(":kw"), Value::Keyword("kw".to_string()));
        assert_eq!(read("abc"), Value::Symbol("abc".to_string()));
        assert_eq!(read("-"), Value::Symbol("-".to_string()));
        assert_eq!(read("1x"), Value::Symbol("1x".to_string()));
        assert_eq!(read(r#""hi""#), Value::Str("hi".to_string()));
    }

    #[test]
    fn test_read_list_and_vector() {
        assert_eq!(
            read("(1 2 3)"),
            Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
        assert!(matches!(read("[1 2]"), Value::Vector(_, _)));
        assert_eq!(read("()"), Value::list(vec![]));
        assert_eq!(
            read("(+ 1 (* 2 3))"),
            Value::list(vec![
                Value::symbol("+"),
                Value::Int(1),
                Value::list(vec![Value::symbol("*"), Value::Int(2), Value::Int(3)]),
            ])
        );
    }

    #[test]
    fn test_read_map() {
        let form = read(r#"{:a 1 "b" 2}"#);
        let Value::Map(entries, _) = &form else {
            panic!("expected a map");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries.get(&MapKey::Keyword("a".to_string())),
            Some(&Value::Int(1))
        );
        assert_eq!(
            entries.get(&MapKey::Str("b".to_string())),
            Some(&Value::Int(2))
        );
    }

    #[test]
    fn test_read_map_rejects_composite_key() {
        assert!(read_str("{(1 2) 3}").is_err());
        assert!(read_str("{[1] 2}").is_err());
        assert!(read_str("{{} 2}").is_err());
    }

    #[test]
    fn test_read_map_odd_forms() {
        assert!(read_str("{:a}").is_err());
        assert!(read_str("{:a 1 :b}").is_err());
    }

    #[test]
    fn test_read_quote_forms() {
        assert_eq!(
            read("'x"),
            Value::list(vec![Value::symbol("quote"), Value::symbol("x")])
        );
        assert_eq!(
            read("`x"),
            Value::list(vec![Value::symbol("quasiquote"), Value::symbol("x")])
        );
        assert_eq!(
            read("~x"),
            Value::list(vec![Value::symbol("unquote"), Value::symbol("x")])
        );
        assert_eq!(
            read("~@x"),
            Value::list(vec![Value::symbol("splice-unquote"), Value::symbol("x")])
        );
        assert_eq!(
            read("@a"),
            Value::list(vec![Value::symbol("deref"), Value::symbol("a")])
        );
    }

    #[test]
    fn test_read_with_meta() {
        let form = read("^{:doc 1} [1 2]");
        let Value::List(items, _) = &form else {
            panic!("expected a with-meta call");
        };
        assert_eq!(items[0], Value::symbol("with-meta"));
        assert!(matches!(items[1], Value::Vector(_, _)));
        assert!(matches!(items[2], Value::Map(_, _)));
    }

    #[test]
    fn test_read_errors() {
        assert!(read_str("(1 2").is_err());
        assert!(read_str(")").is_err());
        assert!(read_str("[1").is_err());
        assert!(read_str("'").is_err());
    }

    #[test]
    fn test_read_empty_input() {
        assert_eq!(read_str("").unwrap(), None);
        assert_eq!(read_str("   ,, ").unwrap(), None);
        assert_eq!(read_str("; just a comment").unwrap(), None);
    }
}

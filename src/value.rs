// ABOUTME: Value types representing mallow data structures and expressions

use crate::env::Environment;
use crate::error::EvalError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Native function payload. Builtins are closures so registration can
/// capture state such as the root environment handed to `eval`.
pub type BuiltinFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// The runtime value and AST node type. The language is homoiconic, so the
/// reader produces exactly this type and the evaluator consumes it.
///
/// Sequences and maps carry their payload behind `Rc` so that values clone
/// cheaply; the second slot on the collection variants is metadata
/// (`with-meta`/`meta`), which defaults to nil and never takes part in
/// equality.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Keyword(String), // printed with a leading colon, stored without
    Symbol(String),
    List(Rc<Vec<Value>>, Rc<Value>),
    Vector(Rc<Vec<Value>>, Rc<Value>),
    Map(Rc<HashMap<MapKey, Value>>, Rc<Value>),
    Builtin(Rc<Builtin>),
    Closure(Rc<Closure>),
    Atom(Rc<RefCell<Value>>),
}

/// A built-in function together with the name it was registered under.
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
    pub meta: Value,
}

/// A user-defined function: parameter names, an unevaluated body, and the
/// environment captured at `fn*` time. `defmacro!` never flips `is_macro`
/// on a shared closure; it binds a fresh copy with the flag set.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Value,
    pub env: Rc<Environment>,
    pub is_macro: bool,
    pub meta: Value,
}

/// Hash-map keys are restricted to scalar values. The reader enforces this
/// for literals and `hash-map`/`assoc` enforce it for programmatic
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Nil,
    Bool(bool),
    Int(i64),
    Str(String),
    Keyword(String),
    Symbol(String),
}

impl MapKey {
    /// Converts a scalar value into a key. Returns `None` for sequences,
    /// maps, functions, and atoms.
    pub fn from_value(value: &Value) -> Option<MapKey> {
        match value {
            Value::Nil => Some(MapKey::Nil),
            Value::Bool(b) => Some(MapKey::Bool(*b)),
            Value::Int(n) => Some(MapKey::Int(*n)),
            Value::Str(s) => Some(MapKey::Str(s.clone())),
            Value::Keyword(k) => Some(MapKey::Keyword(k.clone())),
            Value::Symbol(s) => Some(MapKey::Symbol(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            MapKey::Nil => Value::Nil,
            MapKey::Bool(b) => Value::Bool(*b),
            MapKey::Int(n) => Value::Int(*n),
            MapKey::Str(s) => Value::Str(s.clone()),
            MapKey::Keyword(k) => Value::Keyword(k.clone()),
            MapKey::Symbol(s) => Value::Symbol(s.clone()),
        }
    }
}

impl Value {
    pub fn list(items: Vec<Value>) -> Value {
        Value::List(Rc::new(items), Rc::new(Value::Nil))
    }

    pub fn vector(items: Vec<Value>) -> Value {
        Value::Vector(Rc::new(items), Rc::new(Value::Nil))
    }

    pub fn map(entries: HashMap<MapKey, Value>) -> Value {
        Value::Map(Rc::new(entries), Rc::new(Value::Nil))
    }

    pub fn symbol(name: impl Into<String>) -> Value {
        Value::Symbol(name.into())
    }

    pub fn atom(value: Value) -> Value {
        Value::Atom(Rc::new(RefCell::new(value)))
    }

    pub fn builtin(
        name: &'static str,
        func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Value {
        Value::Builtin(Rc::new(Builtin {
            name,
            func: Rc::new(func),
            meta: Value::Nil,
        }))
    }

    /// Everything is truthy except `false` and `nil`.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Items of a list or vector; `None` for everything else.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items, _) | Value::Vector(items, _) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Human-readable type tag used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Keyword(_) => "keyword",
            Value::Symbol(_) => "symbol",
            Value::List(_, _) => "list",
            Value::Vector(_, _) => "vector",
            Value::Map(_, _) => "map",
            Value::Builtin(_) | Value::Closure(_) => "function",
            Value::Atom(_) => "atom",
        }
    }

    /// Copy of this value with new metadata attached. `None` when the value
    /// cannot carry metadata (scalars and atoms).
    pub fn with_meta(&self, meta: Value) -> Option<Value> {
        match self {
            Value::List(items, _) => Some(Value::List(items.clone(), Rc::new(meta))),
            Value::Vector(items, _) => Some(Value::Vector(items.clone(), Rc::new(meta))),
            Value::Map(entries, _) => Some(Value::Map(entries.clone(), Rc::new(meta))),
            Value::Builtin(b) => Some(Value::Builtin(Rc::new(Builtin {
                name: b.name,
                func: b.func.clone(),
                meta,
            }))),
            Value::Closure(c) => Some(Value::Closure(Rc::new(Closure {
                params: c.params.clone(),
                body: c.body.clone(),
                env: c.env.clone(),
                is_macro: c.is_macro,
                meta,
            }))),
            _ => None,
        }
    }

    /// The metadata attached to this value; `None` for non-carriers.
    pub fn meta(&self) -> Option<Value> {
        match self {
            Value::List(_, meta) | Value::Vector(_, meta) | Value::Map(_, meta) => {
                Some((**meta).clone())
            }
            Value::Builtin(b) => Some(b.meta.clone()),
            Value::Closure(c) => Some(c.meta.clone()),
            _ => None,
        }
    }
}

/// Structural equality. Lists and vectors compare element-wise and are
/// interchangeable; maps compare by key set and per-key value equality;
/// functions never compare equal, not even to themselves; atoms compare by
/// cell identity. Metadata is ignored throughout.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (
                Value::List(a, _) | Value::Vector(a, _),
                Value::List(b, _) | Value::Vector(b, _),
            ) => a == b,
            (Value::Map(a, _), Value::Map(b, _)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::printer::pr_str(self, true))
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// The captured environment is skipped: closures stored in an environment
// that they also capture would otherwise recurse while formatting.
impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("params", &self.params)
            .field("is_macro", &self.is_macro)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_equality() {
        assert_eq!(Value::Int(42), Value::Int(42));
        assert_ne!(Value::Int(42), Value::Int(43));
        assert_eq!(Value::Nil, Value::Nil);
        assert_ne!(Value::Int(1), Value::Str("1".to_string()));
        assert_ne!(Value::Str("x".to_string()), Value::Symbol("x".to_string()));
        assert_ne!(Value::Keyword("a".to_string()), Value::Str("a".to_string()));
    }

    #[test]
    fn test_list_vector_equality() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let vector = Value::vector(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(list, vector);
        assert_eq!(vector, list);

        let shorter = Value::list(vec![Value::Int(1)]);
        assert_ne!(list, shorter);
    }

    #[test]
    fn test_nested_sequence_equality() {
        let a = Value::list(vec![Value::Int(1), Value::vector(vec![Value::Int(2)])]);
        let b = Value::list(vec![Value::Int(1), Value::list(vec![Value::Int(2)])]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_map_equality() {
        let mut m1 = HashMap::new();
        m1.insert(MapKey::Keyword("a".to_string()), Value::Int(1));
        let mut m2 = HashMap::new();
        m2.insert(MapKey::Keyword("a".to_string()), Value::Int(1));
        assert_eq!(Value::map(m1.clone()), Value::map(m2));

        let mut m3 = HashMap::new();
        m3.insert(MapKey::Keyword("a".to_string()), Value::Int(2));
        assert_ne!(Value::map(m1), Value::map(m3));
    }

    #[test]
    fn test_functions_never_equal() {
        let f = Value::builtin("id", |args| Ok(args[0].clone()));
        assert_ne!(f, f.clone());
        assert_ne!(f, f);
    }

    #[test]
    fn test_atom_identity_equality() {
        let a = Value::atom(Value::Int(1));
        let same = a.clone();
        assert_eq!(a, same);
        assert_ne!(a, Value::atom(Value::Int(1)));
    }

    #[test]
    fn test_metadata_ignored_by_equality() {
        let plain = Value::list(vec![Value::Int(1)]);
        let tagged = plain.with_meta(Value::Keyword("tag".to_string())).unwrap();
        assert_eq!(plain, tagged);
        assert_eq!(tagged.meta().unwrap(), Value::Keyword("tag".to_string()));
    }

    #[test]
    fn test_with_meta_rejects_scalars() {
        assert!(Value::Int(1).with_meta(Value::Nil).is_none());
        assert!(Value::Nil.with_meta(Value::Nil).is_none());
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(0).is_truthy());
        assert!(Value::list(vec![]).is_truthy());
        assert!(Value::Str(String::new()).is_truthy());
    }

    #[test]
    fn test_map_key_rejects_composites() {
        assert!(MapKey::from_value(&Value::list(vec![])).is_none());
        assert!(MapKey::from_value(&Value::map(HashMap::new())).is_none());
        assert_eq!(
            MapKey::from_value(&Value::Keyword("k".to_string())),
            Some(MapKey::Keyword("k".to_string()))
        );
    }
}

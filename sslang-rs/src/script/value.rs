//! Runtime value type for sslang scripts.
//!
//! Every script token starts life as a string.  Values only take on other
//! shapes when a command returns them or when a declared parameter type
//! coerces them, so the union below is closed: coercion and display logic
//! match on it directly.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ── HostObject ────────────────────────────────────────────────────────────────

/// An opaque value owned by the host.
///
/// Scripts can store and pass these around (through variables, history and
/// whole-string substitution) but never look inside them.
#[derive(Clone)]
pub struct HostObject {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostObject {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Rust type name of the wrapped value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostObject({})", self.type_name)
    }
}

/// Two host objects are equal only if they are the same allocation.
impl PartialEq for HostObject {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// An sslang runtime value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Result of commands that return nothing, and of `x=` with no arguments.
    #[default]
    Null,
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(HostObject),
}

impl Value {
    /// Wrap an arbitrary host value.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Value::Object(HostObject::new(value))
    }

    /// Name of the variant, used in coercion error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
            Value::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Representation used for elements nested inside a list or map:
    /// strings are quoted, everything else displays as usual.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                if x.is_finite() && x.fract() == 0.0 {
                    write!(f, "{x:.1}")
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&item.repr())?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", Value::Str(key.clone()).repr(), item.repr())?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => write!(f, "<object {}>", obj.type_name()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_scalars() {
        assert_eq!(Value::Int(-7).to_string(), "-7");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(3.25).to_string(), "3.25");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from("hi").to_string(), "hi");
    }

    #[test]
    fn whole_floats_keep_one_decimal() {
        assert_eq!(Value::Float(1e16).to_string(), "10000000000000000.0");
        assert_eq!(Value::Float(-3e17).to_string(), "-300000000000000000.0");
        assert_eq!(Value::Float(0.5).to_string(), "0.5");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn only_null_is_null() {
        assert!(Value::Null.is_null());
        assert!(!Value::from("").is_null());
        assert!(!Value::List(Vec::new()).is_null());
    }

    #[test]
    fn display_list_quotes_strings() {
        let v = Value::List(vec![Value::Int(1), Value::from("a b"), Value::Null]);
        assert_eq!(v.to_string(), "[1, 'a b', null]");
    }

    #[test]
    fn display_nested_map() {
        let mut map = BTreeMap::new();
        map.insert("b".to_owned(), Value::List(vec![Value::Int(2)]));
        map.insert("a".to_owned(), Value::from("x"));
        assert_eq!(Value::Map(map).to_string(), "{'a': 'x', 'b': [2]}");
    }

    #[test]
    fn repr_escapes_quotes() {
        assert_eq!(Value::from("it's").repr(), "'it\\'s'");
    }

    #[test]
    fn object_identity() {
        let a = Value::object(5u8);
        let b = a.clone();
        let c = Value::object(5u8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_object().and_then(|o| o.downcast_ref::<u8>()), Some(&5));
        assert!(a.to_string().starts_with("<object"));
    }

    #[test]
    fn from_option() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3i64)), Value::Int(3));
    }
}

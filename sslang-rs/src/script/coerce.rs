//! Declared parameter types and value coercion.
//!
//! A parameter may carry a [`TypeTag`].  After binding, a value whose
//! variant already matches the tag is left alone; anything else goes through
//! the tag's conversion, which is also what turns script words (always
//! strings) into numbers, booleans and so on.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::value::Value;

/// Host-supplied conversion function.
pub type ConvertFn = dyn Fn(Value) -> Result<Value, String> + Send + Sync;

/// A named, host-defined conversion used as a parameter type.
///
/// Converters never count as already satisfied: the function runs for
/// every value.
#[derive(Clone)]
pub struct Converter {
    name: String,
    boolean: bool,
    func: Arc<ConvertFn>,
}

impl Converter {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            boolean: false,
            func: Arc::new(func),
        }
    }

    /// Treat parameters of this type as boolean flags (`--name`/`--no-name`).
    pub fn boolean(mut self) -> Self {
        self.boolean = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_boolean(&self) -> bool {
        self.boolean
    }

    pub fn convert(&self, value: Value) -> Result<Value, String> {
        (self.func)(value)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("name", &self.name)
            .field("boolean", &self.boolean)
            .finish_non_exhaustive()
    }
}

/// A declared parameter type.
#[derive(Debug, Clone)]
pub enum TypeTag {
    Str,
    Int,
    Float,
    Bool,
    List,
    Map,
    Custom(Converter),
}

impl TypeTag {
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Str => "str",
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::List => "list",
            TypeTag::Map => "dict",
            TypeTag::Custom(c) => c.name(),
        }
    }

    /// Whether parameters of this type accept flag syntax.
    pub fn is_boolean(&self) -> bool {
        match self {
            TypeTag::Bool => true,
            TypeTag::Custom(c) => c.is_boolean(),
            _ => false,
        }
    }

    /// `true` if `value` already has this type.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (TypeTag::Str, Value::Str(_))
                | (TypeTag::Int, Value::Int(_))
                | (TypeTag::Float, Value::Float(_))
                | (TypeTag::Bool, Value::Bool(_))
                | (TypeTag::List, Value::List(_))
                | (TypeTag::Map, Value::Map(_))
        )
    }

    /// Convert `value` to this type, leaving already-matching values alone.
    pub fn coerce(&self, value: Value) -> Result<Value, String> {
        if self.accepts(&value) {
            return Ok(value);
        }
        match self {
            TypeTag::Str => Ok(Value::Str(value.to_string())),
            TypeTag::Int => to_int(value).map(Value::Int),
            TypeTag::Float => to_float(value).map(Value::Float),
            TypeTag::Bool => to_bool(value).map(Value::Bool),
            TypeTag::List => to_list(value).map(Value::List),
            TypeTag::Map => to_map(value).map(Value::Map),
            TypeTag::Custom(c) => c.convert(value),
        }
    }
}

fn unsupported(value: &Value, target: &str) -> String {
    format!("cannot convert {} to {target}", value.type_name())
}

fn to_int(value: Value) -> Result<i64, String> {
    match value {
        Value::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("invalid literal for int: '{s}'")),
        Value::Float(x) => {
            let t = x.trunc();
            if t.is_finite() && t >= i64::MIN as f64 && t <= i64::MAX as f64 {
                Ok(t as i64)
            } else {
                Err(format!("cannot convert float {x} to int"))
            }
        }
        Value::Bool(b) => Ok(i64::from(b)),
        other => Err(unsupported(&other, "int")),
    }
}

fn to_float(value: Value) -> Result<f64, String> {
    match value {
        Value::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| format!("could not convert string to float: '{s}'")),
        Value::Int(n) => Ok(n as f64),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        other => Err(unsupported(&other, "float")),
    }
}

fn to_bool(value: Value) -> Result<bool, String> {
    match value {
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(format!("not a boolean: '{s}'")),
        },
        Value::Int(n) => Ok(n != 0),
        Value::Float(x) => Ok(x != 0.0),
        other => Err(unsupported(&other, "bool")),
    }
}

fn to_list(value: Value) -> Result<Vec<Value>, String> {
    match value {
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Map(map) => Ok(map.into_keys().map(Value::Str).collect()),
        other => Err(unsupported(&other, "list")),
    }
}

fn to_map(value: Value) -> Result<BTreeMap<String, Value>, String> {
    let items = match value {
        Value::List(items) => items,
        other => return Err(unsupported(&other, "dict")),
    };
    let mut map = BTreeMap::new();
    for (i, item) in items.into_iter().enumerate() {
        match item {
            Value::List(pair) if pair.len() == 2 => {
                let mut pair = pair.into_iter();
                if let (Some(k), Some(v)) = (pair.next(), pair.next()) {
                    map.insert(k.to_string(), v);
                }
            }
            _ => return Err(format!("dict sequence element #{i} is not a key/value pair")),
        }
    }
    Ok(map)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

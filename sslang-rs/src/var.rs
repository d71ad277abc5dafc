//! Variable store for one script run.
//!
//! Only assignment statements write here.  An assignment always replaces
//! the previous value wholesale.

use std::collections::HashMap;

use crate::script::value::Value;

/// Name → value table.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Returns `true` if the variable is set (even to null).
    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Iterate over all variables, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get() {
        let mut vars = VariableStore::new();
        vars.set("x", Value::Int(1));
        assert_eq!(vars.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn overwrite_replaces_whole_value() {
        let mut vars = VariableStore::new();
        vars.set("x", Value::List(vec![Value::Int(1), Value::Int(2)]));
        vars.set("x", Value::from("new"));
        assert_eq!(vars.get("x"), Some(&Value::from("new")));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn null_counts_as_set() {
        let mut vars = VariableStore::new();
        vars.set("empty", Value::Null);
        assert!(vars.contains("empty"));
        assert!(!vars.contains("absent"));
        assert_eq!(vars.get("absent"), None);
    }
}

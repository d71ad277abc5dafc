//! Command declarations and the function registry.
//!
//! Hosts describe each command up front with a [`CommandSpec`] (its
//! parameter list) and an invoker closure, and register both in a
//! [`RegistryBuilder`].  The finished [`FunctionRegistry`] is read-only and
//! can be shared between any number of interpreter runs.
//!
//! ```rust
//! use sslang::script::command::{CommandSpec, FunctionRegistry, ParamSpec};
//! use sslang::script::coerce::TypeTag;
//! use sslang::script::value::Value;
//!
//! let mut builder = FunctionRegistry::builder();
//! builder
//!     .register(
//!         CommandSpec::new("double").param(ParamSpec::positional("number").typed(TypeTag::Int)),
//!         |args| Ok(Value::Int(args.int("number")? * 2)),
//!     )
//!     .unwrap();
//! let registry = builder.build();
//! assert!(registry.contains("double"));
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::coerce::TypeTag;
use super::error::SpecError;
use super::value::Value;

// ── Parameters ────────────────────────────────────────────────────────────────

/// How a parameter receives its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Filled by position, or by name.
    Positional,
    /// Filled by name only.
    KeywordOnly,
    /// Collects surplus positional values into a list.
    VariadicPositional,
    /// Collects surplus keyword values into a map.
    VariadicKeyword,
}

/// One declared parameter.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub declared_type: Option<TypeTag>,
    /// Used when the caller omits the parameter.  Never coerced.
    pub default: Option<Value>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            declared_type: None,
            default: None,
        }
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Positional)
    }

    pub fn keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::KeywordOnly)
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VariadicPositional)
    }

    pub fn variadic_keyword(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::VariadicKeyword)
    }

    /// Declare the parameter's type.  For variadic parameters the type
    /// applies to each collected element.
    pub fn typed(mut self, tag: TypeTag) -> Self {
        self.declared_type = Some(tag);
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, ParamKind::VariadicPositional | ParamKind::VariadicKeyword)
    }

    pub fn is_boolean(&self) -> bool {
        self.declared_type.as_ref().is_some_and(TypeTag::is_boolean)
    }
}

/// `true` if `name` is a valid identifier: a letter or `_` followed by
/// letters, digits or `_`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

// ── CommandSpec ───────────────────────────────────────────────────────────────

/// Declared parameter schema of a command.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub name: String,
    pub params: Vec<ParamSpec>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter.  Ordering rules are checked at registration.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    pub fn param_named(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn accepts_extra_positional(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VariadicPositional)
    }

    pub fn accepts_extra_keyword(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::VariadicKeyword)
    }

    /// Names that take `--name` / `--no-name` flag syntax.
    pub fn flag_names(&self) -> HashSet<&str> {
        self.params
            .iter()
            .filter(|p| p.is_boolean())
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Check parameter names and ordering.
    ///
    /// Order is: positional parameters, an optional variadic positional,
    /// keyword-only parameters, an optional variadic keyword.  Required
    /// positional parameters may not follow defaulted ones.
    pub fn validate(&self) -> Result<(), SpecError> {
        let misplaced = |param: &ParamSpec, reason: &'static str| SpecError::MisplacedParam {
            command: self.name.clone(),
            param: param.name.clone(),
            reason,
        };

        let mut seen = HashSet::new();
        let mut after_positional = false;
        let mut after_var_positional = false;
        let mut after_var_keyword = false;
        let mut saw_default = false;

        for param in &self.params {
            if !is_identifier(&param.name) {
                return Err(SpecError::InvalidParamName {
                    command: self.name.clone(),
                    param: param.name.clone(),
                });
            }
            if !seen.insert(param.name.as_str()) {
                return Err(SpecError::DuplicateParam {
                    command: self.name.clone(),
                    param: param.name.clone(),
                });
            }
            if after_var_keyword {
                return Err(misplaced(param, "nothing may follow the variadic keyword parameter"));
            }
            match param.kind {
                ParamKind::Positional => {
                    if after_positional {
                        return Err(misplaced(param, "positional parameters must come first"));
                    }
                    if saw_default && !param.has_default() {
                        return Err(misplaced(param, "required parameter follows a defaulted one"));
                    }
                    saw_default |= param.has_default();
                }
                ParamKind::VariadicPositional => {
                    if after_var_positional {
                        return Err(misplaced(param, "only one variadic positional parameter is allowed"));
                    }
                    if after_positional {
                        return Err(misplaced(param, "variadic positional must precede keyword-only parameters"));
                    }
                    after_positional = true;
                    after_var_positional = true;
                }
                ParamKind::KeywordOnly => after_positional = true,
                ParamKind::VariadicKeyword => after_var_keyword = true,
            }
        }
        Ok(())
    }
}

// ── Bound arguments ───────────────────────────────────────────────────────────

/// A parameter together with the value bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArg {
    pub name: String,
    pub kind: ParamKind,
    pub value: Value,
}

/// Arguments handed to an invoker, in parameter declaration order.
///
/// Every declared parameter is present: omitted ones carry their default,
/// variadic ones an (possibly empty) list or map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundArgs {
    args: Vec<BoundArg>,
}

impl BoundArgs {
    pub fn new(args: Vec<BoundArg>) -> Self {
        Self { args }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    /// Move a value out, leaving null behind.
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.args
            .iter_mut()
            .find(|a| a.name == name)
            .map(|a| std::mem::take(&mut a.value))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundArg> {
        self.args.iter()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn into_vec(self) -> Vec<BoundArg> {
        self.args
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.get(name).ok_or_else(|| anyhow!("missing argument \"{name}\""))
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        let v = self.require(name)?;
        v.as_str()
            .ok_or_else(|| anyhow!("argument \"{name}\" is {}, expected str", v.type_name()))
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        let v = self.require(name)?;
        v.as_int()
            .ok_or_else(|| anyhow!("argument \"{name}\" is {}, expected int", v.type_name()))
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        let v = self.require(name)?;
        v.as_float()
            .ok_or_else(|| anyhow!("argument \"{name}\" is {}, expected float", v.type_name()))
    }

    pub fn bool(&self, name: &str) -> Result<bool> {
        let v = self.require(name)?;
        v.as_bool()
            .ok_or_else(|| anyhow!("argument \"{name}\" is {}, expected bool", v.type_name()))
    }

    pub fn list(&self, name: &str) -> Result<&[Value]> {
        let v = self.require(name)?;
        v.as_list()
            .ok_or_else(|| anyhow!("argument \"{name}\" is {}, expected list", v.type_name()))
    }

    pub fn map(&self, name: &str) -> Result<&BTreeMap<String, Value>> {
        let v = self.require(name)?;
        v.as_map()
            .ok_or_else(|| anyhow!("argument \"{name}\" is {}, expected dict", v.type_name()))
    }
}

// ── Registry ──────────────────────────────────────────────────────────────────

/// The callable half of a registered command.
pub type Invoker = Arc<dyn Fn(BoundArgs) -> Result<Value> + Send + Sync>;

/// A registered command: its schema and invoker.
#[derive(Clone)]
pub struct Command {
    spec: CommandSpec,
    invoker: Invoker,
}

impl Command {
    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    pub fn invoke(&self, args: BoundArgs) -> Result<Value> {
        (self.invoker)(args)
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("spec", &self.spec).finish_non_exhaustive()
    }
}

/// Read-only map from command name to [`Command`].
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    commands: HashMap<String, Command>,
}

impl FunctionRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Collects commands before freezing them into a [`FunctionRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    commands: HashMap<String, Command>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `spec` and register it with its invoker.
    pub fn register<F>(&mut self, spec: CommandSpec, invoker: F) -> Result<&mut Self, SpecError>
    where
        F: Fn(BoundArgs) -> Result<Value> + Send + Sync + 'static,
    {
        spec.validate()?;
        if self.commands.contains_key(&spec.name) {
            return Err(SpecError::DuplicateCommand(spec.name));
        }
        let name = spec.name.clone();
        self.commands.insert(
            name,
            Command {
                spec,
                invoker: Arc::new(invoker),
            },
        );
        Ok(self)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn build(self) -> FunctionRegistry {
        FunctionRegistry {
            commands: self.commands,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Argument splitting and signature binding.
//!
//! [`split_args`] turns a statement's words into positional and keyword
//! arguments; [`bind`] matches them against a [`CommandSpec`] and applies
//! declared-type coercion.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

use super::command::{is_identifier, BoundArg, BoundArgs, CommandSpec, ParamKind, ParamSpec};
use super::error::ScriptError;
use super::stmt::RawArg;
use super::value::Value;

// ── Splitting ─────────────────────────────────────────────────────────────────

/// Arguments after splitting, before substitution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitArgs {
    pub positional: Vec<RawArg>,
    /// In first-seen order; a repeated name keeps its slot and takes the
    /// later value.
    pub keyword: Vec<(String, RawArg)>,
}

impl SplitArgs {
    fn set_keyword(&mut self, name: String, value: RawArg) {
        match self.keyword.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.keyword.push((name, value)),
        }
    }
}

/// Split `args` into positional and keyword arguments.
///
/// - `--` makes every later argument positional, verbatim.
/// - `--name=value` is a keyword argument.
/// - `--name` is `name=true` when `name` is in `flags`, `--no-name` is
///   `name=false`; otherwise the next argument is the value.
/// - Dashes in keyword names become underscores.
/// - Anything else, including already-typed values, is positional.
pub fn split_args(args: Vec<RawArg>, flags: &HashSet<&str>) -> Result<SplitArgs, ScriptError> {
    let mut out = SplitArgs::default();
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        let token = match arg {
            RawArg::Token(t) => t,
            value => {
                out.positional.push(value);
                continue;
            }
        };
        if token == "--" {
            out.positional.extend(iter);
            break;
        }
        let Some(option) = token.strip_prefix("--") else {
            out.positional.push(RawArg::Token(token));
            continue;
        };

        let (name, value) = match option.split_once('=') {
            Some((name, value)) => (name.replace('-', "_"), RawArg::Token(value.to_owned())),
            None => {
                let name = option.replace('-', "_");
                let negated = name.strip_prefix("no_");
                let base = negated.unwrap_or(&name);
                if flags.contains(base) {
                    let value = RawArg::Value(Value::Bool(negated.is_none()));
                    (base.to_owned(), value)
                } else {
                    match iter.next() {
                        Some(value) => (name, value),
                        None => return Err(ScriptError::MissingValue(name)),
                    }
                }
            }
        };
        if !is_identifier(&name) {
            return Err(ScriptError::InvalidArgumentName(name));
        }
        out.set_keyword(name, value);
    }
    Ok(out)
}

// ── Binding ───────────────────────────────────────────────────────────────────

fn take_keyword(keyword: &mut Vec<(String, Value)>, name: &str) -> Option<Value> {
    let idx = keyword.iter().position(|(k, _)| k == name)?;
    Some(keyword.remove(idx).1)
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|n| format!("'{n}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn coerce_param(spec: &CommandSpec, param: &ParamSpec, value: Value) -> Result<Value, ScriptError> {
    let Some(tag) = &param.declared_type else {
        return Ok(value);
    };
    let coerce_one = |v: Value| {
        tag.coerce(v).map_err(|message| ScriptError::TypeCoercion {
            command: spec.name.clone(),
            param: param.name.clone(),
            message,
        })
    };
    match (param.kind, value) {
        (ParamKind::VariadicPositional, Value::List(items)) => {
            items.into_iter().map(coerce_one).collect::<Result<_, _>>().map(Value::List)
        }
        (ParamKind::VariadicKeyword, Value::Map(map)) => map
            .into_iter()
            .map(|(k, v)| Ok::<_, ScriptError>((k, coerce_one(v)?)))
            .collect::<Result<_, _>>()
            .map(Value::Map),
        (_, value) => coerce_one(value),
    }
}

/// Bind arguments to `spec`'s parameters and coerce declared types.
///
/// The result lists every parameter in declaration order.  Defaults fill
/// omitted parameters and are not coerced.
pub fn bind(
    spec: &CommandSpec,
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
) -> Result<BoundArgs, ScriptError> {
    let binding_error = |message: String| ScriptError::Binding {
        command: spec.name.clone(),
        message,
    };

    let positional_slots = spec
        .params
        .iter()
        .filter(|p| p.kind == ParamKind::Positional)
        .count();
    if positional.len() > positional_slots && !spec.accepts_extra_positional() {
        return Err(binding_error(format!(
            "takes {positional_slots} positional argument{} but {} were given",
            if positional_slots == 1 { "" } else { "s" },
            positional.len()
        )));
    }

    let mut positional = positional.into_iter();
    let mut keyword = keyword;
    let mut slots: Vec<(&ParamSpec, Option<Value>, bool)> = Vec::with_capacity(spec.params.len());
    let mut missing = Vec::new();

    for param in &spec.params {
        let (value, supplied) = match param.kind {
            ParamKind::Positional => match positional.next() {
                Some(v) => {
                    if keyword.iter().any(|(k, _)| *k == param.name) {
                        return Err(binding_error(format!(
                            "multiple values for argument '{}'",
                            param.name
                        )));
                    }
                    (Some(v), true)
                }
                None => match take_keyword(&mut keyword, &param.name) {
                    Some(v) => (Some(v), true),
                    None => (param.default.clone(), false),
                },
            },
            ParamKind::KeywordOnly => match take_keyword(&mut keyword, &param.name) {
                Some(v) => (Some(v), true),
                None => (param.default.clone(), false),
            },
            ParamKind::VariadicPositional => (Some(Value::List(positional.by_ref().collect())), true),
            ParamKind::VariadicKeyword => {
                let rest: BTreeMap<String, Value> = keyword.drain(..).collect();
                (Some(Value::Map(rest)), true)
            }
        };
        if value.is_none() {
            missing.push(param.name.clone());
        }
        slots.push((param, value, supplied));
    }

    if !missing.is_empty() {
        return Err(binding_error(format!(
            "missing required argument{}: {}",
            if missing.len() == 1 { "" } else { "s" },
            quoted(&missing)
        )));
    }
    if !keyword.is_empty() {
        let names: Vec<String> = keyword.into_iter().map(|(k, _)| k).collect();
        return Err(binding_error(format!(
            "unexpected keyword argument{} {}",
            if names.len() == 1 { "" } else { "s" },
            quoted(&names)
        )));
    }

    let mut bound = Vec::with_capacity(slots.len());
    for (param, value, supplied) in slots {
        let value = value.unwrap_or_default();
        let value = if supplied {
            coerce_param(spec, param, value)?
        } else {
            value
        };
        trace!(command = %spec.name, param = %param.name, kind = value.type_name(), "bound");
        bound.push(BoundArg {
            name: param.name.clone(),
            kind: param.kind,
            value,
        });
    }
    Ok(BoundArgs::new(bound))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

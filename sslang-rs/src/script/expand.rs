//! Placeholder substitution.
//!
//! | Sequence  | Meaning                                            |
//! |-----------|----------------------------------------------------|
//! | `$name`   | Variable `name` (`[_A-Za-z0-9]+`)                  |
//! | `${name}` | Same, braced form                                  |
//! | `$N`      | N-th most recent command result (`$0` = latest)    |
//! | `$$`      | Literal `$`                                        |
//! | `$)`      | Literal `)`                                        |
//!
//! Substitution runs in two passes: [`scan`] splits the text into literal
//! and placeholder segments, then [`substitute`] resolves them.  When the
//! whole argument is a single placeholder the stored [`Value`] comes back
//! untouched, so lists, maps and host objects survive.  Any other mix is
//! rendered to a string.
//!
//! This module also locates `$( … )` command-substitution groups in an
//! argument list; running the enclosed command is the interpreter's job.

use tracing::trace;

use super::error::ScriptError;
use super::stmt::RawArg;
use super::value::Value;
use crate::history::HistoryBuffer;
use crate::var::VariableStore;

// ── Scanning ──────────────────────────────────────────────────────────────────

/// A piece of scanned argument text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// `$$` or `$)`.
    Escaped(char),
    Placeholder(&'a str),
}

/// Result of [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template<'a> {
    /// Nothing to substitute.
    Plain,
    /// The text is exactly one placeholder.
    Whole(&'a str),
    Parts(Vec<Segment<'a>>),
}

fn is_name_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// `true` if `name` can be referenced as `$name`.
pub fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_name_byte)
}

/// Split `text` into literal, escape and placeholder segments.
pub fn scan(text: &str) -> Template<'_> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut substituted = false;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }
        let (segment, end) = match bytes.get(i + 1) {
            Some(&b) if b == b'$' || b == b')' => (Segment::Escaped(b as char), i + 2),
            Some(&b) if is_name_byte(b) => {
                let end = i + 1 + bytes[i + 1..].iter().take_while(|&&b| is_name_byte(b)).count();
                (Segment::Placeholder(&text[i + 1..end]), end)
            }
            Some(b'{') => {
                let name_len = bytes[i + 2..].iter().take_while(|&&b| is_name_byte(b)).count();
                let close = i + 2 + name_len;
                if name_len > 0 && bytes.get(close) == Some(&b'}') {
                    (Segment::Placeholder(&text[i + 2..close]), close + 1)
                } else {
                    i += 1;
                    continue;
                }
            }
            _ => {
                // A lone `$` stays literal.
                i += 1;
                continue;
            }
        };
        if literal_start < i {
            segments.push(Segment::Literal(&text[literal_start..i]));
        }
        segments.push(segment);
        substituted = true;
        i = end;
        literal_start = end;
    }

    if !substituted {
        return Template::Plain;
    }
    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    match segments.as_slice() {
        [Segment::Placeholder(name)] => Template::Whole(name),
        _ => Template::Parts(segments),
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// What placeholders resolve against: the variable store first, then the
/// result history for canonical non-negative integers.
#[derive(Debug, Clone, Copy)]
pub struct SubstitutionContext<'a> {
    pub variables: &'a VariableStore,
    pub history: &'a HistoryBuffer,
}

impl<'a> SubstitutionContext<'a> {
    pub fn new(variables: &'a VariableStore, history: &'a HistoryBuffer) -> Self {
        Self { variables, history }
    }

    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        if let Some(v) = self.variables.get(name) {
            return Some(v);
        }
        let back: usize = name.parse().ok()?;
        // `01` is a variable name, not a history index.
        if back.to_string() != name {
            return None;
        }
        self.history.recent(back)
    }

    fn resolve(&self, name: &str) -> Result<&'a Value, ScriptError> {
        self.lookup(name)
            .ok_or_else(|| ScriptError::UnknownVariable(name.to_owned()))
    }
}

/// Substitute placeholders in `text`.
pub fn substitute(text: &str, ctx: &SubstitutionContext<'_>) -> Result<Value, ScriptError> {
    match scan(text) {
        Template::Plain => Ok(Value::Str(text.to_owned())),
        Template::Whole(name) => {
            let value = ctx.resolve(name)?;
            trace!(placeholder = name, kind = value.type_name(), "whole-string substitution");
            Ok(value.clone())
        }
        Template::Parts(segments) => {
            let mut out = String::with_capacity(text.len());
            for segment in segments {
                match segment {
                    Segment::Literal(s) => out.push_str(s),
                    Segment::Escaped(c) => out.push(c),
                    Segment::Placeholder(name) => out.push_str(&ctx.resolve(name)?.to_string()),
                }
            }
            trace!(input = text, output = %out, "string substitution");
            Ok(Value::Str(out))
        }
    }
}

/// Substitute a raw argument.  Already-typed values pass through.
pub fn substitute_arg(arg: RawArg, ctx: &SubstitutionContext<'_>) -> Result<Value, ScriptError> {
    match arg {
        RawArg::Token(text) => substitute(&text, ctx),
        RawArg::Value(v) => Ok(v),
    }
}

// ── Command-substitution groups ───────────────────────────────────────────────

/// Number of trailing `)` that close a group, not counting an escaped `$)`.
fn closing_parens(text: &str) -> i64 {
    let trimmed = text.trim_end_matches(')');
    let mut n = (text.len() - trimmed.len()) as i64;
    if n > 0 && trimmed.ends_with('$') {
        n -= 1;
    }
    n
}

/// Find the index of the argument that closes the `$(` group opened by
/// `args[start]`.
pub fn find_group_end(args: &[RawArg], start: usize) -> Result<usize, ScriptError> {
    let mut depth: i64 = 0;
    for (k, arg) in args.iter().enumerate().skip(start) {
        let Some(token) = arg.as_token() else { continue };
        let body = if k == start {
            depth += 1;
            token.strip_prefix("$(").unwrap_or(token)
        } else {
            if token.starts_with("$(") {
                depth += 1;
            }
            token
        };
        depth -= closing_parens(body);
        if depth <= 0 {
            return Ok(k);
        }
    }
    Err(ScriptError::UnbalancedSubstitution("unmatched $(".to_owned()))
}

/// Strip the outer `$(` and `)` from the group `args[start..=end]` and
/// return the enclosed command words.
pub fn group_contents(args: &[RawArg], start: usize, end: usize) -> Result<Vec<RawArg>, ScriptError> {
    let mut inner = args[start..=end].to_vec();
    let last = inner.len() - 1;
    if let Some(RawArg::Token(t)) = inner.first_mut() {
        if let Some(rest) = t.strip_prefix("$(") {
            *t = rest.to_owned();
        }
    }
    if let Some(RawArg::Token(t)) = inner.get_mut(last) {
        if t.ends_with(')') {
            t.pop();
        }
    }
    // Only the trimmed ends may have become empty.
    if matches!(inner.get(last), Some(RawArg::Token(t)) if t.is_empty()) {
        inner.remove(last);
    }
    if matches!(inner.first(), Some(RawArg::Token(t)) if t.is_empty()) {
        inner.remove(0);
    }
    if inner.is_empty() {
        return Err(ScriptError::UnbalancedSubstitution("empty $( )".to_owned()));
    }
    Ok(inner)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::error::ErrorKind;

    fn stores() -> (VariableStore, HistoryBuffer) {
        let mut vars = VariableStore::new();
        vars.set("name", Value::from("world"));
        vars.set("nums", Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
        let mut history = HistoryBuffer::new();
        history.push(Value::from("A"));
        history.push(Value::from("B"));
        history.push(Value::from("C"));
        (vars, history)
    }

    fn sub(text: &str) -> Result<Value, ScriptError> {
        let (vars, history) = stores();
        substitute(text, &SubstitutionContext::new(&vars, &history))
    }

    fn toks(words: &[&str]) -> Vec<RawArg> {
        words.iter().map(|&w| RawArg::from(w)).collect()
    }

    #[test]
    fn scan_shapes() {
        assert_eq!(scan("plain text"), Template::Plain);
        assert_eq!(scan("cost $ 5"), Template::Plain);
        assert_eq!(scan("$abc"), Template::Whole("abc"));
        assert_eq!(scan("${abc}"), Template::Whole("abc"));
        assert_eq!(
            scan("a${b}c$$"),
            Template::Parts(vec![
                Segment::Literal("a"),
                Segment::Placeholder("b"),
                Segment::Literal("c"),
                Segment::Escaped('$'),
            ])
        );
        // Unclosed brace is literal.
        assert_eq!(scan("${abc"), Template::Plain);
    }

    #[test]
    fn whole_placeholder_keeps_type() {
        assert_eq!(
            sub("$nums").unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn partial_placeholder_stringifies() {
        assert_eq!(sub("item: $nums").unwrap(), Value::from("item: [1, 2, 3]"));
        assert_eq!(sub("hello ${name}!").unwrap(), Value::from("hello world!"));
    }

    #[test]
    fn history_counts_back_from_latest() {
        assert_eq!(sub("$0").unwrap(), Value::from("C"));
        assert_eq!(sub("$1").unwrap(), Value::from("B"));
        assert_eq!(sub("$2").unwrap(), Value::from("A"));
        assert_eq!(sub("$3").unwrap_err().kind(), ErrorKind::UnknownVariable);
        // Non-canonical integers are plain variable names.
        assert_eq!(sub("$00").unwrap_err().kind(), ErrorKind::UnknownVariable);
    }

    #[test]
    fn variables_shadow_history() {
        let (mut vars, history) = stores();
        vars.set("0", Value::Int(99));
        let ctx = SubstitutionContext::new(&vars, &history);
        assert_eq!(substitute("$0", &ctx).unwrap(), Value::Int(99));
    }

    #[test]
    fn unknown_variable_named() {
        let err = sub("x $missing").unwrap_err();
        assert!(matches!(&err, ScriptError::UnknownVariable(n) if n == "missing"));
    }

    #[test]
    fn escapes() {
        assert_eq!(sub("$$name").unwrap(), Value::from("$name"));
        assert_eq!(sub("a$)").unwrap(), Value::from("a)"));
    }

    #[test]
    fn typed_args_pass_through() {
        let (vars, history) = stores();
        let ctx = SubstitutionContext::new(&vars, &history);
        let v = substitute_arg(RawArg::Value(Value::Int(4)), &ctx).unwrap();
        assert_eq!(v, Value::Int(4));
    }

    #[test]
    fn group_single_token() {
        let args = toks(&["$(get_zero)", "tail"]);
        assert_eq!(find_group_end(&args, 0).unwrap(), 0);
        assert_eq!(group_contents(&args, 0, 0).unwrap(), toks(&["get_zero"]));
    }

    #[test]
    fn group_nested() {
        let args = toks(&["$(double", "$(double", "2))", "x"]);
        assert_eq!(find_group_end(&args, 0).unwrap(), 2);
        assert_eq!(group_contents(&args, 0, 2).unwrap(), toks(&["double", "$(double", "2)"]));
    }

    #[test]
    fn group_escaped_paren_does_not_close() {
        let args = toks(&["$(echo", "a$)", "b)"]);
        assert_eq!(find_group_end(&args, 0).unwrap(), 2);
    }

    #[test]
    fn group_errors() {
        let args = toks(&["$(echo", "a"]);
        assert_eq!(find_group_end(&args, 0).unwrap_err().kind(), ErrorKind::UnbalancedSubstitution);
        let args = toks(&["$(", ")"]);
        assert_eq!(find_group_end(&args, 0).unwrap(), 1);
        assert!(group_contents(&args, 0, 1).is_err());
    }
}

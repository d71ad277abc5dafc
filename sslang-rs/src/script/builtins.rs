//! Built-in commands.
//!
//! Registered through [`register`] like any host command.  Nothing here
//! touches process-wide state: console output goes to the [`Output`]
//! handle handed in at registration.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;

use super::coerce::TypeTag;
use super::command::{CommandSpec, ParamSpec, RegistryBuilder};
use super::error::SpecError;
use super::value::Value;

/// Every builtin name, in registration order.
pub const BUILTIN_NAMES: &[&str] = &["print", "fwrite", "fread", "list", "dict", "int", "float"];

// ── Output ────────────────────────────────────────────────────────────────────

enum Sink {
    Stdout,
    Memory(Vec<u8>),
}

/// Where `print` writes.  Clones share the same sink.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Sink>>,
}

impl Output {
    pub fn stdout() -> Self {
        Self::with_sink(Sink::Stdout)
    }

    /// An in-memory buffer, read back with [`Output::contents`].
    pub fn memory() -> Self {
        Self::with_sink(Sink::Memory(Vec::new()))
    }

    fn with_sink(sink: Sink) -> Self {
        Self {
            sink: Arc::new(Mutex::new(sink)),
        }
    }

    pub fn write_str(&self, text: &str) -> io::Result<()> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        match &mut *sink {
            Sink::Stdout => io::stdout().lock().write_all(text.as_bytes()),
            Sink::Memory(buf) => {
                buf.extend_from_slice(text.as_bytes());
                Ok(())
            }
        }
    }

    pub fn flush(&self) -> io::Result<()> {
        let sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        match &*sink {
            Sink::Stdout => io::stdout().flush(),
            Sink::Memory(_) => Ok(()),
        }
    }

    /// Everything written so far.  Always empty for stdout.
    pub fn contents(&self) -> String {
        let sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        match &*sink {
            Sink::Stdout => String::new(),
            Sink::Memory(buf) => String::from_utf8_lossy(buf).into_owned(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let kind = match &*sink {
            Sink::Stdout => "stdout",
            Sink::Memory(_) => "memory",
        };
        f.debug_tuple("Output").field(&kind).finish()
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

/// Which builtins to register.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BuiltinSelection {
    #[default]
    All,
    None,
    Only(Vec<String>),
}

impl BuiltinSelection {
    pub fn includes(&self, name: &str) -> bool {
        match self {
            BuiltinSelection::All => true,
            BuiltinSelection::None => false,
            BuiltinSelection::Only(names) => names.iter().any(|n| n == name),
        }
    }

    /// Reject names that are not builtins.
    pub fn validate(&self) -> Result<(), SpecError> {
        if let BuiltinSelection::Only(names) = self {
            if let Some(bad) = names.iter().find(|n| !BUILTIN_NAMES.contains(&n.as_str())) {
                return Err(SpecError::UnknownBuiltin(bad.clone()));
            }
        }
        Ok(())
    }
}

// ── Registration ──────────────────────────────────────────────────────────────

/// Register the builtins picked by `selection`.  `print` writes to `output`.
pub fn register(
    builder: &mut RegistryBuilder,
    selection: &BuiltinSelection,
    output: Output,
) -> Result<(), SpecError> {
    selection.validate()?;
    for &name in BUILTIN_NAMES.iter().filter(|n| selection.includes(n)) {
        register_one(builder, name, &output)?;
    }
    Ok(())
}

fn register_one(builder: &mut RegistryBuilder, name: &str, output: &Output) -> Result<(), SpecError> {
    match name {
        "print" => {
            let out = output.clone();
            builder.register(
                CommandSpec::new("print")
                    .param(ParamSpec::variadic("values"))
                    .param(ParamSpec::keyword("end").typed(TypeTag::Str).with_default("\n"))
                    .param(ParamSpec::keyword("sep").typed(TypeTag::Str).with_default(" "))
                    .param(ParamSpec::keyword("flush").typed(TypeTag::Bool).with_default(false)),
                move |args| {
                    let text = args
                        .list("values")?
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(args.str("sep")?);
                    out.write_str(&text)?;
                    out.write_str(args.str("end")?)?;
                    if args.bool("flush")? {
                        out.flush()?;
                    }
                    Ok(Value::Null)
                },
            )?;
        }
        "fwrite" => {
            builder.register(
                CommandSpec::new("fwrite")
                    .param(ParamSpec::positional("file").typed(TypeTag::Str))
                    .param(ParamSpec::positional("content")),
                |args| {
                    let file = args.str("file")?;
                    let content = args.get("content").map(Value::to_string).unwrap_or_default();
                    fs::write(file, content).with_context(|| format!("cannot write {file}"))?;
                    Ok(Value::Null)
                },
            )?;
        }
        "fread" => {
            builder.register(
                CommandSpec::new("fread").param(ParamSpec::positional("file").typed(TypeTag::Str)),
                |args| {
                    let file = args.str("file")?;
                    let text = fs::read_to_string(file).with_context(|| format!("cannot read {file}"))?;
                    Ok(Value::Str(text))
                },
            )?;
        }
        "list" => {
            builder.register(CommandSpec::new("list").param(ParamSpec::variadic("args")), |mut args| {
                Ok(args.take("args").unwrap_or_else(|| Value::List(Vec::new())))
            })?;
        }
        "dict" => {
            builder.register(
                CommandSpec::new("dict").param(ParamSpec::variadic_keyword("kwargs")),
                |mut args| Ok(args.take("kwargs").unwrap_or_else(|| Value::Map(Default::default()))),
            )?;
        }
        "int" => {
            builder.register(
                CommandSpec::new("int").param(ParamSpec::positional("value").typed(TypeTag::Int)),
                |args| Ok(Value::Int(args.int("value")?)),
            )?;
        }
        "float" => {
            builder.register(
                CommandSpec::new("float").param(ParamSpec::positional("value").typed(TypeTag::Float)),
                |args| Ok(Value::Float(args.float("value")?)),
            )?;
        }
        other => return Err(SpecError::UnknownBuiltin(other.to_owned())),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::command::FunctionRegistry;
    use crate::script::error::ErrorKind;
    use crate::script::interp::Interpreter;

    fn registry(selection: &BuiltinSelection, output: &Output) -> FunctionRegistry {
        let mut b = FunctionRegistry::builder();
        register(&mut b, selection, output.clone()).unwrap();
        b.build()
    }

    fn run(src: &str) -> (Output, Result<(), crate::script::error::RunError>) {
        let output = Output::memory();
        let reg = registry(&BuiltinSelection::All, &output);
        let result = Interpreter::new(&reg).exec_script(src);
        (output, result)
    }

    #[test]
    fn print_defaults() {
        let (out, res) = run("print hello world\nprint");
        res.unwrap();
        assert_eq!(out.contents(), "hello world\n\n");
    }

    #[test]
    fn print_sep_end_flush() {
        let (out, res) = run("print a b c --sep , --end . --flush\nprint $(list 1 2) --no-flush");
        res.unwrap();
        assert_eq!(out.contents(), "a,b,c.['1', '2']\n");
    }

    #[test]
    fn print_returns_null() {
        let output = Output::memory();
        let reg = registry(&BuiltinSelection::All, &output);
        let mut interp = Interpreter::new(&reg);
        interp.exec_script("print x").unwrap();
        assert_eq!(interp.history().last(), Some(&Value::Null));
    }

    #[test]
    fn conversions_and_containers() {
        let output = Output::memory();
        let reg = registry(&BuiltinSelection::All, &output);
        let mut interp = Interpreter::new(&reg);
        interp
            .exec_script("n= int 7\nf= float 2\nl= list a $n\nd= dict --k v --other 1")
            .unwrap();
        let vars = interp.variables();
        assert_eq!(vars.get("n"), Some(&Value::Int(7)));
        assert_eq!(vars.get("f"), Some(&Value::Float(2.0)));
        assert_eq!(vars.get("l"), Some(&Value::List(vec!["a".into(), Value::Int(7)])));
        assert_eq!(vars.get("d").map(Value::to_string).as_deref(), Some("{'k': 'v', 'other': '1'}"));
    }

    #[test]
    fn int_rejects_text() {
        let (_, res) = run("int seven");
        assert_eq!(res.unwrap_err().kind(), ErrorKind::TypeCoercion);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        let path = path.to_str().unwrap();
        let src = format!("fwrite '{path}' 'some text'\nfread '{path}'\nprint $0");
        let (out, res) = run(&src);
        res.unwrap();
        assert_eq!(out.contents(), "some text\n");
    }

    #[test]
    fn fread_missing_file_is_command_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        let (_, res) = run(&format!("fread '{}'", path.display()));
        let err = res.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(err.to_string().contains("cannot read"), "{err}");
    }

    #[test]
    fn selection() {
        let output = Output::memory();
        let reg = registry(&BuiltinSelection::None, &output);
        assert!(reg.is_empty());

        let only = BuiltinSelection::Only(vec!["print".into(), "int".into()]);
        let reg = registry(&only, &output);
        assert_eq!(reg.names(), ["int", "print"]);

        let bad = BuiltinSelection::Only(vec!["print".into(), "exec".into()]);
        let mut b = FunctionRegistry::builder();
        assert_eq!(
            register(&mut b, &bad, output),
            Err(SpecError::UnknownBuiltin("exec".into()))
        );
        assert!(!b.contains("print"));
    }

    #[test]
    fn all_builtins_register() {
        let reg = registry(&BuiltinSelection::All, &Output::memory());
        assert_eq!(reg.len(), BUILTIN_NAMES.len());
    }

    #[test]
    fn output_clones_share_buffer() {
        let a = Output::memory();
        let b = a.clone();
        a.write_str("x").unwrap();
        b.write_str("y").unwrap();
        assert_eq!(a.contents(), "xy");
        assert_eq!(format!("{a:?}"), "Output(\"memory\")");
    }
}

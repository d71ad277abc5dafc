//! Script interpreter.
//!
//! The [`Interpreter`] owns the variable store and result history of one
//! run and executes statements against a shared, read-only
//! [`FunctionRegistry`].  Execution is single-pass: the first error stops
//! the run and earlier assignments stay in place.

use tracing::{debug, trace};

use super::binder::{bind, split_args};
use super::command::FunctionRegistry;
use super::error::{RunError, ScriptError};
use super::expand::{find_group_end, group_contents, substitute_arg, SubstitutionContext};
use super::stmt::{statements, RawArg, Statement};
use super::value::Value;
use crate::history::HistoryBuffer;
use crate::var::VariableStore;

fn opens_group(arg: &RawArg) -> bool {
    arg.as_token().is_some_and(|t| t.starts_with("$("))
}

/// Executes statements.  One interpreter per run; the registry may be
/// shared between any number of them.
#[derive(Debug)]
pub struct Interpreter<'r> {
    registry: &'r FunctionRegistry,
    vars: VariableStore,
    history: HistoryBuffer,
}

impl<'r> Interpreter<'r> {
    pub fn new(registry: &'r FunctionRegistry) -> Self {
        Self {
            registry,
            vars: VariableStore::new(),
            history: HistoryBuffer::new(),
        }
    }

    pub fn registry(&self) -> &'r FunctionRegistry {
        self.registry
    }

    pub fn variables(&self) -> &VariableStore {
        &self.vars
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Seed a variable before running a script.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) {
        self.vars.set(name, value);
    }

    pub fn into_parts(self) -> (VariableStore, HistoryBuffer) {
        (self.vars, self.history)
    }

    // ── Execution ─────────────────────────────────────────────────────────

    /// Parse and execute `src` statement by statement.
    ///
    /// Parsing is lazy, so a tokenize error on a later line surfaces only
    /// after every earlier statement has run.
    pub fn exec_script(&mut self, src: &str) -> Result<(), RunError> {
        for stmt in statements(src) {
            self.exec_statement(stmt?)?;
        }
        Ok(())
    }

    /// Execute one statement.
    pub fn exec_statement(&mut self, stmt: Statement) -> Result<(), RunError> {
        let (statement, line) = (stmt.index, stmt.line);
        debug!(
            statement,
            line,
            kind = if stmt.is_assignment() { "assign" } else { "call" },
            function = stmt.function.as_deref().unwrap_or(""),
            "exec"
        );
        self.run(stmt).map_err(|error| RunError { statement, line, error })
    }

    fn run(&mut self, stmt: Statement) -> Result<(), ScriptError> {
        match (stmt.target, stmt.function) {
            (Some(target), None) => {
                let value = self.literal_value(stmt.args)?;
                trace!(variable = %target, kind = value.type_name(), "assign");
                self.vars.set(target, value);
            }
            (Some(target), Some(function)) => {
                let value = self.call(&function, stmt.args)?;
                trace!(variable = %target, kind = value.type_name(), "assign result");
                self.vars.set(target, value);
            }
            (None, Some(function)) => {
                let value = self.call(&function, stmt.args)?;
                self.history.push(value);
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// Value of an `x= …` statement with at most one argument.
    fn literal_value(&self, args: Vec<RawArg>) -> Result<Value, ScriptError> {
        let mut args = self.expand_commands(args)?;
        match args.len() {
            0 => Ok(Value::Null),
            1 => {
                let ctx = SubstitutionContext::new(&self.vars, &self.history);
                substitute_arg(args.remove(0), &ctx)
            }
            n => Err(ScriptError::Binding {
                command: "=".to_owned(),
                message: format!("assignment takes one value but {n} were given"),
            }),
        }
    }

    /// Call the command `name` with unsplit arguments and return its result.
    ///
    /// Nothing is recorded in the history; callers decide what to keep.
    pub fn call(&self, name: &str, args: Vec<RawArg>) -> Result<Value, ScriptError> {
        let registry = self.registry;
        let command = registry
            .get(name)
            .ok_or_else(|| ScriptError::UnknownFunction(name.to_owned()))?;
        let spec = command.spec();

        let args = self.expand_commands(args)?;
        let split = split_args(args, &spec.flag_names())?;

        let ctx = SubstitutionContext::new(&self.vars, &self.history);
        let positional = split
            .positional
            .into_iter()
            .map(|arg| substitute_arg(arg, &ctx))
            .collect::<Result<Vec<_>, _>>()?;
        let keyword = split
            .keyword
            .into_iter()
            .map(|(k, arg)| Ok::<_, ScriptError>((k, substitute_arg(arg, &ctx)?)))
            .collect::<Result<Vec<_>, ScriptError>>()?;

        let bound = bind(spec, positional, keyword)?;
        trace!(command = name, args = bound.len(), "invoke");
        command.invoke(bound).map_err(|error| ScriptError::Command {
            name: name.to_owned(),
            error,
        })
    }

    /// Replace every `$( … )` group in `args` by the result of running it.
    fn expand_commands(&self, args: Vec<RawArg>) -> Result<Vec<RawArg>, ScriptError> {
        if !args.iter().any(opens_group) {
            return Ok(args);
        }
        let mut out = Vec::with_capacity(args.len());
        let mut i = 0;
        while i < args.len() {
            if !opens_group(&args[i]) {
                out.push(args[i].clone());
                i += 1;
                continue;
            }
            let end = find_group_end(&args, i)?;
            let mut inner = group_contents(&args, i, end)?.into_iter();
            let name = match inner.next() {
                Some(RawArg::Token(name)) => name,
                Some(RawArg::Value(v)) => return Err(ScriptError::UnknownFunction(v.to_string())),
                None => return Err(ScriptError::UnbalancedSubstitution("empty $( )".to_owned())),
            };
            trace!(command = %name, "command substitution");
            let value = self.call(&name, inner.collect())?;
            out.push(RawArg::Value(value));
            i = end + 1;
        }
        Ok(out)
    }
}

/// Run `src` with a fresh interpreter and hand back its final state.
pub fn run_script<'r>(registry: &'r FunctionRegistry, src: &str) -> Result<Interpreter<'r>, RunError> {
    let mut interp = Interpreter::new(registry);
    interp.exec_script(src)?;
    Ok(interp)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

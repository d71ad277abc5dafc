//! Error types for tokenizing, binding and running scripts.

use thiserror::Error;

/// Coarse classification of a [`ScriptError`], for callers that want to
/// branch on the failure without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Tokenize,
    InvalidArgumentName,
    MissingValue,
    UnknownFunction,
    UnknownVariable,
    Binding,
    TypeCoercion,
    UnbalancedSubstitution,
    Command,
}

/// A failure raised while processing one statement.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("{message}")]
    Tokenize { line: usize, message: String },

    #[error("invalid argument name \"{0}\"")]
    InvalidArgumentName(String),

    #[error("no value for keyword argument \"{0}\"")]
    MissingValue(String),

    #[error("no such function \"{0}\"")]
    UnknownFunction(String),

    #[error("unknown variable \"{0}\"")]
    UnknownVariable(String),

    #[error("{command}: {message}")]
    Binding { command: String, message: String },

    #[error("{command}: cannot convert argument \"{param}\": {message}")]
    TypeCoercion {
        command: String,
        param: String,
        message: String,
    },

    #[error("{0}")]
    UnbalancedSubstitution(String),

    #[error("{name}: {error:#}")]
    Command { name: String, error: anyhow::Error },
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScriptError::Tokenize { .. } => ErrorKind::Tokenize,
            ScriptError::InvalidArgumentName(_) => ErrorKind::InvalidArgumentName,
            ScriptError::MissingValue(_) => ErrorKind::MissingValue,
            ScriptError::UnknownFunction(_) => ErrorKind::UnknownFunction,
            ScriptError::UnknownVariable(_) => ErrorKind::UnknownVariable,
            ScriptError::Binding { .. } => ErrorKind::Binding,
            ScriptError::TypeCoercion { .. } => ErrorKind::TypeCoercion,
            ScriptError::UnbalancedSubstitution(_) => ErrorKind::UnbalancedSubstitution,
            ScriptError::Command { .. } => ErrorKind::Command,
        }
    }
}

/// The terminal error of a script run: the failing statement's position
/// plus the underlying [`ScriptError`].
#[derive(Debug, Error)]
#[error("line {line}, statement {statement}: {error}")]
pub struct RunError {
    /// 1-based index of the statement among all statements of the script.
    pub statement: usize,
    /// 1-based physical line on which the statement starts.
    pub line: usize,
    pub error: ScriptError,
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

/// A command declaration that cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("command \"{0}\" is already registered")]
    DuplicateCommand(String),

    #[error("{command}: duplicate parameter \"{param}\"")]
    DuplicateParam { command: String, param: String },

    #[error("{command}: parameter \"{param}\" is out of order: {reason}")]
    MisplacedParam {
        command: String,
        param: String,
        reason: &'static str,
    },

    #[error("{command}: invalid parameter name \"{param}\"")]
    InvalidParamName { command: String, param: String },

    #[error("unknown builtin \"{0}\"")]
    UnknownBuiltin(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_error_display_carries_position() {
        let err = RunError {
            statement: 3,
            line: 7,
            error: ScriptError::UnknownFunction("nope".into()),
        };
        assert_eq!(err.to_string(), "line 7, statement 3: no such function \"nope\"");
        assert_eq!(err.kind(), ErrorKind::UnknownFunction);
    }

    #[test]
    fn command_error_renders_whole_chain() {
        let err = ScriptError::Command {
            name: "fread".into(),
            error: anyhow::anyhow!("disk on fire").context("reading x.txt"),
        };
        assert_eq!(err.to_string(), "fread: reading x.txt: disk on fire");
        assert_eq!(err.kind(), ErrorKind::Command);
    }
}

//! Statement model and the script-level parser.
//!
//! A script is a sequence of token lines (see [`super::lexer`]).  Each line
//! is one statement:
//!
//! - `name arg…` calls the command `name`.
//! - `x= …` assigns to the variable `x`.  With no arguments it assigns
//!   null; with one argument (or a single `$( … )` group) it assigns that
//!   value; with more it calls the first argument as a command and assigns
//!   its result.

use super::error::{RunError, ScriptError};
use super::expand::{find_group_end, is_variable_name};
use super::lexer::{tokenize, Line, Tokenize};
use super::value::Value;

/// An argument before substitution and binding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArg {
    /// A word from the script text.
    Token(String),
    /// An already-typed value, produced by command substitution.
    Value(Value),
}

impl RawArg {
    pub fn as_token(&self) -> Option<&str> {
        match self {
            RawArg::Token(t) => Some(t),
            RawArg::Value(_) => None,
        }
    }
}

impl From<&str> for RawArg {
    fn from(s: &str) -> Self {
        RawArg::Token(s.to_owned())
    }
}

impl From<String> for RawArg {
    fn from(s: String) -> Self {
        RawArg::Token(s)
    }
}

/// One parsed statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based position among the script's statements.
    pub index: usize,
    /// 1-based physical line the statement starts on.
    pub line: usize,
    /// Assignment target, for `x= …` statements.
    pub target: Option<String>,
    /// Command to call.  `None` only for assignments of a literal value.
    pub function: Option<String>,
    pub args: Vec<RawArg>,
}

impl Statement {
    pub fn is_assignment(&self) -> bool {
        self.target.is_some()
    }

    /// Build a statement from one token line.
    pub fn from_line(index: usize, line: Line) -> Result<Self, ScriptError> {
        let mut tokens = line.tokens.into_iter().map(RawArg::Token);
        // Lines are never empty: the tokenizer drops them.
        let head = match tokens.next() {
            Some(RawArg::Token(head)) => head,
            _ => String::new(),
        };
        let rest: Vec<RawArg> = tokens.collect();

        let Some(target) = head.strip_suffix('=') else {
            return Ok(Statement {
                index,
                line: line.number,
                target: None,
                function: Some(head),
                args: rest,
            });
        };
        if !is_variable_name(target) {
            return Err(ScriptError::InvalidArgumentName(target.to_owned()));
        }

        // A lone command-substitution group counts as one argument.
        let literal = rest.len() <= 1
            || (rest[0].as_token().is_some_and(|t| t.starts_with("$("))
                && find_group_end(&rest, 0)? == rest.len() - 1);
        let (function, args) = if literal {
            (None, rest)
        } else {
            let mut rest = rest.into_iter();
            let function = rest.next().and_then(|a| a.as_token().map(str::to_owned));
            (function, rest.collect())
        };

        Ok(Statement {
            index,
            line: line.number,
            target: Some(target.to_owned()),
            function,
            args,
        })
    }
}

/// Lazily parse `src` into statements.
pub fn statements(src: &str) -> Statements<'_> {
    Statements {
        lines: tokenize(src),
        index: 0,
        last_line: 0,
    }
}

/// Iterator returned by [`statements`].
#[derive(Debug, Clone)]
pub struct Statements<'a> {
    lines: Tokenize<'a>,
    index: usize,
    last_line: usize,
}

impl Iterator for Statements<'_> {
    type Item = Result<Statement, RunError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.lines.next()?;
        self.index += 1;
        let index = self.index;
        Some(match next {
            Ok(line) => {
                let number = line.number;
                self.last_line = number;
                Statement::from_line(index, line).map_err(|error| RunError {
                    statement: index,
                    line: number,
                    error,
                })
            }
            Err(error) => {
                let line = match &error {
                    ScriptError::Tokenize { line, .. } => *line,
                    _ => self.last_line + 1,
                };
                Err(RunError { statement: index, line, error })
            }
        })
    }
}

/// Parse a whole script eagerly.
pub fn parse_script(src: &str) -> Result<Vec<Statement>, RunError> {
    statements(src).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::error::ErrorKind;

    fn parse_one(src: &str) -> Statement {
        parse_script(src).unwrap().remove(0)
    }

    fn toks(args: &[RawArg]) -> Vec<&str> {
        args.iter().filter_map(RawArg::as_token).collect()
    }

    #[test]
    fn call_statement() {
        let s = parse_one("repeater hello --times 3");
        assert_eq!(s.function.as_deref(), Some("repeater"));
        assert!(!s.is_assignment());
        assert_eq!(toks(&s.args), ["hello", "--times", "3"]);
    }

    #[test]
    fn assignment_forms() {
        let s = parse_one("x=");
        assert_eq!(s.target.as_deref(), Some("x"));
        assert_eq!(s.function, None);
        assert!(s.args.is_empty());

        let s = parse_one("x= $0");
        assert_eq!(s.function, None);
        assert_eq!(toks(&s.args), ["$0"]);

        let s = parse_one("x= double 21");
        assert_eq!(s.function.as_deref(), Some("double"));
        assert_eq!(toks(&s.args), ["21"]);
    }

    #[test]
    fn assignment_of_single_command_group() {
        let s = parse_one("x= $(double 21)");
        assert_eq!(s.function, None);
        assert_eq!(toks(&s.args), ["$(double", "21)"]);

        // A group followed by more words is an ordinary call.
        let s = parse_one("x= $(name) 21");
        assert_eq!(s.function.as_deref(), Some("$(name)"));
    }

    #[test]
    fn invalid_target_rejected() {
        let err = parse_script("a-b= 1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgumentName);
        assert_eq!(err.statement, 1);
    }

    #[test]
    fn positions_are_tracked() {
        let stmts = parse_script("# header\none\n\ntwo \\\n  more\nthree").unwrap();
        let pos: Vec<(usize, usize)> = stmts.iter().map(|s| (s.index, s.line)).collect();
        assert_eq!(pos, [(1, 2), (2, 4), (3, 6)]);
    }

    #[test]
    fn tokenize_error_position() {
        let err = parse_script("one\ntwo 'oops").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Tokenize);
        assert_eq!((err.statement, err.line), (2, 2));
        assert_eq!(err.to_string(), "line 2, statement 2: no closing quotation");
    }

    #[test]
    fn lazy_statements_yield_before_error() {
        let mut it = statements("ok\nbad \"");
        assert!(it.next().unwrap().is_ok());
        assert!(it.next().unwrap().is_err());
    }
}

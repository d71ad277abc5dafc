//! Runtime configuration for the `sslang` binary.
//!
//! Resolved once from [`CliArgs`] and the environment:
//!
//! | Source | Setting |
//! |--------|---------|
//! | `SCRIPT` argument | script source (`-`/absent = stdin) |
//! | `--no-builtins`, `-b NAME` | builtin selection |
//! | `SSLANG_BUILTINS` | comma-separated builtin subset, when no flag is given |
//! | `SSLANG_LOG`, then `RUST_LOG` | log filter directive |
//! | `-v` | default log level when no filter is set |

use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::script::builtins::BuiltinSelection;
use crate::script::error::SpecError;

pub const BUILTINS_ENV: &str = "SSLANG_BUILTINS";
pub const LOG_ENV: &str = "SSLANG_LOG";

// ── Public types ──────────────────────────────────────────────────────────────

/// Where the script text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    Stdin,
    File(PathBuf),
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: ScriptSource,
    pub builtins: BuiltinSelection,
    /// `EnvFilter` directive.
    pub log_filter: String,
    pub dump_tokens: bool,
}

// ── Resolution ────────────────────────────────────────────────────────────────

impl Config {
    /// Resolve from `args` and the process environment.
    pub fn from_args(args: &CliArgs) -> Result<Self, SpecError> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    pub fn resolve<F>(args: &CliArgs, env: F) -> Result<Self, SpecError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match args.script.as_deref() {
            None => ScriptSource::Stdin,
            Some(p) if p == Path::new("-") => ScriptSource::Stdin,
            Some(p) => ScriptSource::File(p.to_path_buf()),
        };

        let builtins = if args.no_builtins {
            BuiltinSelection::None
        } else if !args.builtin.is_empty() {
            BuiltinSelection::Only(args.builtin.clone())
        } else {
            match env(BUILTINS_ENV) {
                Some(list) => parse_builtin_list(&list),
                None => BuiltinSelection::All,
            }
        };
        builtins.validate()?;

        let log_filter = env(LOG_ENV)
            .or_else(|| env("RUST_LOG"))
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| verbosity_level(args.verbose).to_owned());

        Ok(Config {
            source,
            builtins,
            log_filter,
            dump_tokens: args.dump_tokens,
        })
    }
}

/// Default log level for `count` repetitions of `-v`.
pub fn verbosity_level(count: u8) -> &'static str {
    match count {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// An empty list selects nothing.
fn parse_builtin_list(list: &str) -> BuiltinSelection {
    let names: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_owned)
        .collect();
    if names.is_empty() {
        BuiltinSelection::None
    } else {
        BuiltinSelection::Only(names)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::cli::parse_argv;

    fn resolve(argv: &[&str], env: &[(&str, &str)]) -> Result<Config, SpecError> {
        let mut full = vec!["sslang"];
        full.extend_from_slice(argv);
        let args = parse_argv(full).unwrap();
        let env: HashMap<String, String> =
            env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::resolve(&args, |k| env.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let c = resolve(&[], &[]).unwrap();
        assert_eq!(c.source, ScriptSource::Stdin);
        assert_eq!(c.builtins, BuiltinSelection::All);
        assert_eq!(c.log_filter, "warn");
        assert!(!c.dump_tokens);
    }

    #[test]
    fn script_path() {
        let c = resolve(&["a.ss"], &[]).unwrap();
        assert_eq!(c.source, ScriptSource::File(PathBuf::from("a.ss")));
        let c = resolve(&["-"], &[]).unwrap();
        assert_eq!(c.source, ScriptSource::Stdin);
    }

    #[test]
    fn builtin_precedence() {
        let env = [(BUILTINS_ENV, "print, int")];
        let c = resolve(&[], &env).unwrap();
        assert_eq!(c.builtins, BuiltinSelection::Only(vec!["print".into(), "int".into()]));

        let c = resolve(&["-b", "list"], &env).unwrap();
        assert_eq!(c.builtins, BuiltinSelection::Only(vec!["list".into()]));

        let c = resolve(&["--no-builtins"], &env).unwrap();
        assert_eq!(c.builtins, BuiltinSelection::None);

        let c = resolve(&[], &[(BUILTINS_ENV, " , ")]).unwrap();
        assert_eq!(c.builtins, BuiltinSelection::None);
    }

    #[test]
    fn unknown_builtin_is_error() {
        let err = resolve(&["-b", "exec"], &[]).unwrap_err();
        assert_eq!(err, SpecError::UnknownBuiltin("exec".into()));
        assert!(resolve(&[], &[(BUILTINS_ENV, "print,nope")]).is_err());
    }

    #[test]
    fn log_filter_sources() {
        assert_eq!(resolve(&["-v"], &[]).unwrap().log_filter, "info");
        assert_eq!(resolve(&["-vvv"], &[]).unwrap().log_filter, "trace");
        assert_eq!(resolve(&["-v"], &[("RUST_LOG", "debug")]).unwrap().log_filter, "debug");
        let env = [(LOG_ENV, "sslang=trace"), ("RUST_LOG", "debug")];
        assert_eq!(resolve(&[], &env).unwrap().log_filter, "sslang=trace");
    }
}

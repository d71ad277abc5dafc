//! The sslang scripting language.
//!
//! A script is a list of shell-like command lines run in order against a
//! host-supplied [`FunctionRegistry`]:
//!
//! - Tokenizing: line continuation, escape decoding, POSIX-style quoting
//!   and `#` comments ([`lexer`])
//! - Statements and `x= …` assignments ([`stmt`])
//! - `$name`, `${name}` and `$N` history placeholders, `$( … )` command
//!   substitution ([`expand`])
//! - `--key value` / `--flag` argument splitting and signature binding
//!   with declared-type coercion ([`binder`], [`coerce`])
//! - A small builtin command set ([`builtins`])
//!
//! # Quick start
//!
//! ```rust
//! use sslang::script::{CommandSpec, FunctionRegistry, Interpreter, ParamSpec, TypeTag, Value};
//!
//! let mut builder = FunctionRegistry::builder();
//! builder
//!     .register(
//!         CommandSpec::new("double").param(ParamSpec::positional("n").typed(TypeTag::Int)),
//!         |args| Ok(Value::Int(args.int("n")? * 2)),
//!     )
//!     .unwrap();
//! let registry = builder.build();
//!
//! let mut interp = Interpreter::new(&registry);
//! interp.exec_script("double 21\nx= $0").unwrap();
//! assert_eq!(interp.variables().get("x"), Some(&Value::Int(42)));
//! ```

pub mod binder;
pub mod builtins;
pub mod coerce;
pub mod command;
pub mod error;
pub mod expand;
pub mod interp;
pub mod lexer;
pub mod stmt;
pub mod value;

// Re-exports for convenience.
pub use builtins::{BuiltinSelection, Output};
pub use coerce::{Converter, TypeTag};
pub use command::{BoundArgs, CommandSpec, FunctionRegistry, ParamKind, ParamSpec, RegistryBuilder};
pub use error::{ErrorKind, RunError, ScriptError, SpecError};
pub use interp::{run_script, Interpreter};
pub use stmt::{parse_script, RawArg, Statement};
pub use value::{HostObject, Value};

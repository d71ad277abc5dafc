//! Command-line arguments for the `sslang` binary.
//!
//! Usage:
//!   sslang [--no-builtins] [-b NAME]... [--dump-tokens] [-v]... [SCRIPT]
//!
//! `SCRIPT` is a file path; `-` or nothing reads the script from stdin.

use std::path::PathBuf;

use clap::Parser;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default, Parser)]
#[command(name = "sslang", version, about = "Run a sslang script")]
pub struct CliArgs {
    /// Script file (`-` or absent reads stdin).
    pub script: Option<PathBuf>,

    /// Register no builtin commands.
    #[arg(long, conflicts_with = "builtin")]
    pub no_builtins: bool,

    /// Register only the named builtins (repeatable).
    #[arg(short = 'b', long = "builtin", value_name = "NAME")]
    pub builtin: Vec<String>,

    /// Print the tokenized lines and exit without executing.
    #[arg(long)]
    pub dump_tokens: bool,

    /// Raise log verbosity (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`, exiting with usage on error.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}

/// Parse an explicit argument list (the first item is the program name).
pub fn parse_argv<I, T>(argv: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    CliArgs::try_parse_from(argv)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

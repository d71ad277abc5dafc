//! `sslang` entry point.
//!
//! Usage:
//!   sslang script.ss        # Run a script file
//!   sslang < script.ss      # Run a script from stdin
//!   sslang --dump-tokens f  # Show how a script tokenizes

use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sslang::cli::{self, CliArgs};
use sslang::config::{Config, ScriptSource};
use sslang::script::{builtins, lexer, FunctionRegistry, Interpreter, Output};

fn main() -> ExitCode {
    let args = cli::parse_args();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("sslang: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn read_source(source: &ScriptSource) -> Result<String> {
    match source {
        ScriptSource::Stdin => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("cannot read script from stdin")?;
            Ok(text)
        }
        ScriptSource::File(path) => {
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
        }
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let config = Config::from_args(args)?;
    init_tracing(&config.log_filter);
    debug!(?config, "resolved configuration");

    let src = read_source(&config.source)?;

    if config.dump_tokens {
        for line in lexer::tokenize(&src) {
            let line = line?;
            println!("{:>4}: {:?}", line.number, line.tokens);
        }
        return Ok(());
    }

    let mut builder = FunctionRegistry::builder();
    builtins::register(&mut builder, &config.builtins, Output::stdout())?;
    let registry = builder.build();
    info!(commands = registry.len(), "registry ready");

    let mut interp = Interpreter::new(&registry);
    interp.exec_script(&src)?;
    info!(results = interp.history().len(), "script finished");
    Ok(())
}

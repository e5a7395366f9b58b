//! Command-line interface for ssm-env
//!
//! A single command: select parameters by `--paths` and/or `--tags`, then print
//! them as environment assignments or run a command with them set.

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, EXIT_VALIDATION};

mod exec;
mod load;
pub mod utils;

pub use load::load_env_vars;

/// Load AWS SSM Parameter Store parameters as environment variables
#[derive(Parser)]
#[command(name = "ssm-env")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    load: load::LoadArgs,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,
}

/// Parse arguments, run, and return the process exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    load::run(cli.load)
}

/// Exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(EXIT_VALIDATION)
}

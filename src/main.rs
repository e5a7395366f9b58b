//! ssm-env: load AWS SSM Parameter Store parameters as environment variables
//!
//! Prints `NAME=value` lines for every selected parameter, or runs a command
//! with them in its environment.

use ssm_env::cli;

fn main() {
    match cli::run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(cli::exit_code(&err));
        }
    }
}

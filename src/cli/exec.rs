//! Run a child command with the loaded variables in its environment

use anyhow::{Context, Result};
use std::process::{Command, ExitStatus};

use crate::project::EnvVars;

/// Spawn `command` with `vars` added to the inherited environment and wait
/// for it. Returns the exit code the caller should exit with.
pub fn run_command(command: &[String], vars: &EnvVars) -> Result<i32> {
    let (program, args) = command.split_first().context("No command given")?;

    tracing::debug!(program = %program, variables = vars.len(), "Running command");
    let status = Command::new(program)
        .args(args)
        .envs(vars)
        .status()
        .with_context(|| format!("Failed to run command: {program}"))?;

    Ok(exit_code(status))
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    // Killed by a signal: report it the way shells do.
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

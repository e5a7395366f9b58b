//! Output rendering (dotenv lines, shell exports, JSON)

use crate::project::EnvVars;
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `NAME=value`, one per line
    #[default]
    Dotenv,
    /// `export NAME='value'`, safe to `eval` in a POSIX shell
    Export,
    /// A single JSON object
    Json,
}

pub fn render(vars: &EnvVars, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Dotenv => {
            lines(vars.iter().map(|(name, value)| format!("{name}={value}")))
        }
        OutputFormat::Export => {
            lines(vars.iter().map(|(name, value)| format!("export {name}={}", shell_quote(value))))
        }
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(vars)?),
    };
    Ok(rendered)
}

fn lines(entries: impl Iterator<Item = String>) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry);
        out.push('\n');
    }
    out
}

/// Wrap in single quotes; embedded quotes become `'\''`.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

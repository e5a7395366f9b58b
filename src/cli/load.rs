//! Parameter loading command

use anyhow::{Context, Result};
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use super::exec::run_command;
use super::utils::parse_csv;
use crate::config::{
    load_config, load_paths_file, merge_cli_with_config, CliOverrides, Settings,
    DEFAULT_PATHS_FILE,
};
use crate::error::Error;
use crate::fetch::{ParameterFetcher, Retrier};
use crate::project::{project, CollisionPolicy, EnvVars};
use crate::render::{render, OutputFormat};
use crate::store::{ParameterStore, SsmStore};

#[derive(Args)]
pub struct LoadArgs {
    /// Path hierarchies to load (comma-separated, e.g. '/prod/app/,/prod/shared/')
    #[arg(short, long, env = "SSM_PATHS", value_name = "PATHS")]
    pub paths: Option<String>,

    /// Only load parameters carrying these tag keys (comma-separated)
    #[arg(short, long, env = "SSM_TAGS", value_name = "TAGS")]
    pub tags: Option<String>,

    /// AWS region of the parameter store
    #[arg(long, env = "SSM_REGION", value_name = "REGION")]
    pub region: Option<String>,

    /// Retries after a throttled request before giving up
    #[arg(long, env = "SSM_MAX_RETRIES", value_name = "N")]
    pub max_retries: Option<u32>,

    /// Upper bound of the random pause between throttled retries
    #[arg(long, env = "SSM_MAX_BACKOFF_MS", value_name = "MS")]
    pub max_backoff_ms: Option<u64>,

    /// Give up if loading takes longer than this (0 disables)
    #[arg(long, env = "SSM_TIMEOUT", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// What to do when two parameters map to the same variable name
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_collision: Option<CollisionPolicy>,

    /// Path to config file (ssm-env.toml or ssm-env.yml)
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// File listing one path per line, used when no paths or tags are given
    #[arg(long, value_name = "FILE")]
    pub paths_file: Option<PathBuf>,

    /// Run this command with the parameters in its environment instead of printing them
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl LoadArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            paths: parse_csv(&self.paths),
            tags: parse_csv(&self.tags),
            region: self.region.clone(),
            max_retries: self.max_retries,
            max_backoff_ms: self.max_backoff_ms,
            timeout_secs: self.timeout,
            format: self.format,
            on_collision: self.on_collision,
        }
    }
}

pub fn run(args: LoadArgs) -> Result<i32> {
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;

    let file_config = load_config(&cwd, args.config.as_deref())
        .map_err(|e| Error::Config(format!("{e:#}")))?;

    let paths_file = args.paths_file.clone();
    let settings = merge_cli_with_config(file_config, args.overrides(), || match paths_file {
        Some(path) => load_paths_file(&path, true),
        None => load_paths_file(&cwd.join(DEFAULT_PATHS_FILE), false),
    })?;

    tracing::debug!(
        paths = settings.selection.paths().len(),
        tags = settings.selection.tags().len(),
        region = ?settings.region,
        "Resolved settings"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let vars = runtime.block_on(async {
        let store = SsmStore::connect(settings.region.as_deref()).await;
        load_env_vars(Arc::new(store), &settings).await
    })?;

    if vars.is_empty() {
        tracing::warn!("No parameters matched the selection");
    }

    if !args.command.is_empty() {
        return run_command(&args.command, &vars);
    }

    let rendered = render(&vars, settings.format)?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes()).context("Failed writing to stdout")?;
    stdout.flush().context("Failed writing to stdout")?;
    Ok(0)
}

/// One fetch-and-project cycle against `store`.
///
/// Nothing is returned unless every store call succeeds.
pub async fn load_env_vars(
    store: Arc<dyn ParameterStore>,
    settings: &Settings,
) -> Result<EnvVars, Error> {
    let mut retrier = Retrier::new(settings.retry);
    if let Some(timeout) = settings.timeout {
        retrier = retrier.with_timeout(timeout);
    }

    let fetcher = ParameterFetcher::new(store, retrier);
    let params = fetcher.fetch(&settings.selection).await?;
    project(&params, settings.on_collision)
}

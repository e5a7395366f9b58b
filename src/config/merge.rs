//! Merge CLI flags (with their environment fallbacks) over the config file

use super::loader::FileConfig;
use crate::domain::Selection;
use crate::error::Error;
use crate::fetch::retry::{RetryPolicy, DEFAULT_MAX_BACKOFF, DEFAULT_MAX_RETRIES};
use crate::project::CollisionPolicy;
use crate::render::OutputFormat;
use anyhow::Result;
use std::time::Duration;

/// Values taken from the command line or its `SSM_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub paths: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub region: Option<String>,
    pub max_retries: Option<u32>,
    pub max_backoff_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub format: Option<OutputFormat>,
    pub on_collision: Option<CollisionPolicy>,
}

/// Fully resolved, validated settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub selection: Selection,
    pub region: Option<String>,
    pub retry: RetryPolicy,
    pub timeout: Option<Duration>,
    pub format: OutputFormat,
    pub on_collision: CollisionPolicy,
}

/// Combine sources and validate the selection.
///
/// `fallback_paths` is consulted only when neither paths nor tags were given
/// by any other source.
pub fn merge_cli_with_config<F>(
    file: FileConfig,
    cli: CliOverrides,
    fallback_paths: F,
) -> Result<Settings>
where
    F: FnOnce() -> Result<Vec<String>>,
{
    let paths_given = cli.paths.is_some() || !file.paths.is_empty();
    let mut paths = cli.paths.unwrap_or(file.paths);
    let tags = cli.tags.unwrap_or(file.tags);

    if !paths_given && tags.is_empty() {
        paths = fallback_paths()?;
    }

    let selection = Selection::parse(&paths, &tags).map_err(Error::from)?;

    let retry = RetryPolicy {
        max_retries: cli.max_retries.or(file.max_retries).unwrap_or(DEFAULT_MAX_RETRIES),
        max_backoff: cli
            .max_backoff_ms
            .or(file.max_backoff_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MAX_BACKOFF),
    };

    let timeout = cli
        .timeout_secs
        .or(file.timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    Ok(Settings {
        selection,
        region: cli.region.or(file.region).filter(|r| !r.trim().is_empty()),
        retry,
        timeout,
        format: cli.format.or(file.format).unwrap_or_default(),
        on_collision: cli.on_collision.or(file.on_collision).unwrap_or_default(),
    })
}

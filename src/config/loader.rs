//! Config file and paths file loading

use crate::cli::utils::split_csv;
use crate::project::CollisionPolicy;
use crate::render::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

/// Paths file read when no selection is given anywhere else.
pub const DEFAULT_PATHS_FILE: &str = "ssm_paths.txt";

const SECTION: &str = "ssm-env";

/// Settings that may come from a config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    #[serde(deserialize_with = "string_or_list")]
    pub paths: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub tags: Vec<String>,
    pub region: Option<String>,
    pub max_retries: Option<u32>,
    pub max_backoff_ms: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub format: Option<OutputFormat>,
    pub on_collision: Option<CollisionPolicy>,
}

/// Accept either `"a, b"` or `["a", "b"]`.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => split_csv(&s),
        StringOrList::Many(items) => {
            items.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string).collect()
        }
    })
}

/// Load the config file named on the command line, or the first one found in `dir`.
///
/// An explicit file that cannot be read or parsed is an error. A discovered
/// file that fails to parse is reported and ignored.
pub fn load_config(dir: &Path, config_path: Option<&Path>) -> Result<FileConfig> {
    let config_path_provided = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(dir),
    };

    let Some(config_file) = discovered else {
        return Ok(FileConfig::default());
    };

    let content = fs::read_to_string(&config_file)
        .with_context(|| format!("Failed reading config file: {}", config_file.display()))?;

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(anyhow::anyhow!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        )),
    };

    match parsed {
        Ok(cfg) => {
            tracing::debug!(file = %config_file.display(), "Loaded config file");
            Ok(cfg)
        }
        Err(e) if config_path_provided => Err(e),
        Err(e) => {
            tracing::warn!(
                "Ignoring auto-discovered config {}: {:#}",
                config_file.display(),
                e
            );
            Ok(FileConfig::default())
        }
    }
}

/// Parse TOML config, allowing settings nested under an `[ssm-env]` table.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<FileConfig> {
    let raw: toml::Value = toml::from_str(content)
        .with_context(|| format!("Invalid TOML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().with_context(|| format!("Invalid TOML config: {}", config_file.display()))
}

/// Parse YAML config, allowing settings nested under an `ssm-env` key.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<FileConfig> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content)
        .with_context(|| format!("Invalid YAML syntax: {}", config_file.display()))?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    serde_yaml::from_value(config_val)
        .with_context(|| format!("Invalid YAML config: {}", config_file.display()))
}

fn discover_config(dir: &Path) -> Option<PathBuf> {
    let candidates = ["ssm-env.toml", ".ssm-env.toml", "ssm-env.yml", "ssm-env.yaml"];

    candidates.iter().map(|c| dir.join(c)).find(|path| path.is_file())
}

/// Read one path per line, skipping blank lines and `#` comments.
///
/// A missing file yields no paths unless it was named explicitly.
pub fn load_paths_file(path: &Path, explicit: bool) -> Result<Vec<String>> {
    if !explicit && !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed reading paths file: {}", path.display()))?;

    let paths: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    tracing::debug!(file = %path.display(), count = paths.len(), "Read paths file");
    Ok(paths)
}
